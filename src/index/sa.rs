/// 构建拼接文档集合的后缀数组（倍增法，O(n log n) 排序）。
/// 输入为原始字节文本，0 为文档终止符，允许出现多个。
/// 第 k 个终止符按出现顺序赋秩 k，任何实际字节的秩都排在全部终止符
/// 之后，因此以终止符开头的后缀恰好按文档序落在数组最前部
/// （第 k 行即第 k 个文档的终止符后缀）—— FM 层端标跳转依赖该性质。
pub fn build_sa(text: &[u8]) -> Vec<u64> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    let num_texts = text.iter().filter(|&&b| b == 0).count() as i64;

    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<i64> = Vec::with_capacity(n);
    let mut term = 0i64;
    for &b in text {
        if b == 0 {
            rank.push(term);
            term += 1;
        } else {
            rank.push(num_texts - 1 + i64::from(b));
        }
    }
    let mut tmp: Vec<i64> = vec![0; n];

    let mut k = 1usize;
    while k < n {
        sa.sort_unstable_by(|&i, &j| {
            let r1 = rank[i];
            let r2 = rank[j];
            if r1 != r2 {
                return r1.cmp(&r2);
            }
            let r1n = if i + k < n { rank[i + k] } else { -1 };
            let r2n = if j + k < n { rank[j + k] } else { -1 };
            r1n.cmp(&r2n)
        });

        tmp[sa[0]] = 0;
        for i in 1..n {
            let a = sa[i - 1];
            let b = sa[i];
            let prev = (rank[a], if a + k < n { rank[a + k] } else { -1 });
            let curr = (rank[b], if b + k < n { rank[b + k] } else { -1 });
            tmp[b] = tmp[a] + i64::from(curr != prev);
        }

        // 复制回 rank
        rank.copy_from_slice(&tmp);
        if rank[sa[n - 1]] as usize == n - 1 {
            break;
        }
        k <<= 1;
    }

    sa.into_iter().map(|x| x as u64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 朴素对照：按同样的终止符秩规则比较后缀
    fn naive_sa(text: &[u8]) -> Vec<u64> {
        let n = text.len();
        let num_texts = text.iter().filter(|&&b| b == 0).count() as i64;
        let mut keys: Vec<i64> = Vec::with_capacity(n);
        let mut term = 0i64;
        for &b in text {
            if b == 0 {
                keys.push(term);
                term += 1;
            } else {
                keys.push(num_texts - 1 + i64::from(b));
            }
        }
        let mut suffixes: Vec<(usize, &[i64])> = (0..n).map(|i| (i, &keys[i..])).collect();
        suffixes.sort_by(|a, b| a.1.cmp(b.1));
        suffixes.into_iter().map(|(i, _)| i as u64).collect()
    }

    fn make_text(len: usize) -> Vec<u8> {
        let mut x: u32 = 1_234_567;
        let mut v = Vec::with_capacity(len);
        for i in 0..len {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            // 每 7 个位置左右放一个终止符，最后一位必为终止符
            if i + 1 == len || x % 7 == 0 {
                v.push(0);
            } else {
                v.push(b'A' + (x % 4) as u8);
            }
        }
        v
    }

    #[test]
    fn sa_basic() {
        // 文本：A C G T \0
        let text = b"ACGT\x00";
        let sa = build_sa(text);
        // 期望：$, ACGT$, CGT$, GT$, T$
        assert_eq!(sa, vec![4, 0, 1, 2, 3]);
    }

    #[test]
    fn terminators_rank_in_document_order() {
        // 两个文档，若终止符等价则后续内容会打乱前两行的次序；
        // 独立秩保证第 k 行就是文档 k 的终止符后缀
        let text = b"AB\x00CD\x00";
        let sa = build_sa(text);
        assert_eq!(sa[0], 2);
        assert_eq!(sa[1], 5);
        assert_eq!(sa, naive_sa(text));
    }

    #[test]
    fn sa_matches_naive_on_small_random_texts() {
        for len in 1..=24 {
            let text = make_text(len);
            let sa_fast = build_sa(&text);
            let sa_naive = naive_sa(&text);
            assert_eq!(sa_fast, sa_naive, "mismatch on len={}", len);
        }
    }
}
