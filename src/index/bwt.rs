/// 根据后缀数组构建（伪）BWT：bwt[r] = text[sa[r] - 1]，首位回绕取末字节。
/// text 为带 0 终止符的拼接字节文本。
pub fn build_bwt(text: &[u8], sa: &[u64]) -> Vec<u8> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    let mut bwt = Vec::with_capacity(n);
    for &p in sa {
        let i = p as usize;
        let prev = if i == 0 { text[n - 1] } else { text[i - 1] };
        bwt.push(prev);
    }
    bwt
}
