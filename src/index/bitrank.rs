use anyhow::{Context, Result};
use std::io::{Read, Write};

use super::serial;

/// 静态位向量的 rank/select 索引：
/// - 分层计数：每 256 bit 一个超块（`rs`，u64 累计），每 64 bit 字一个块
///   （`rb`，超块内累计，单字节即可容纳 0..=192）。
/// - `rank(i)` 为闭区间 `[0, i]` 内置位数，O(1)：超块计数 + 块计数 + 尾部字 popcount。
/// - `select(x)` 为第 x 个置位（1 起），超块二分 + 块内顺扫 + 字内逐位消去。
/// - 构建后不可变，查询路径只读，可被任意多线程并发访问。
#[derive(Debug, Clone)]
pub struct BitRank {
    /// 位数组本体，低位在前；末字超出 n 的位清零
    data: Vec<u64>,
    /// 位长度
    n: u64,
    /// 超块累计计数：rs[k] = [0, k*256) 内置位数
    rs: Vec<u64>,
    /// 块计数：rb[j] = 所在超块起点到第 j 字之间的置位数
    rb: Vec<u8>,
    /// 总置位数
    ones: u64,
}

/// 每超块的字数（256 bit 超块）
const SUPER_FACTOR: usize = 4;

impl BitRank {
    /// 从原始位数组构建。`data` 的所有权转移进来，长度须为 ceil(n/64) 字。
    pub fn new(mut data: Vec<u64>, n: u64) -> Self {
        let words = ((n + 63) / 64) as usize;
        assert_eq!(data.len(), words, "bit array length mismatch");
        // 清掉末字的越界位，select0 依赖补零
        if n % 64 != 0 {
            if let Some(last) = data.last_mut() {
                *last &= !0u64 >> (64 - (n % 64) as u32);
            }
        }

        let supers = ((n + 255) / 256) as usize;
        let mut rs = vec![0u64; supers.max(1)];
        let mut rb = vec![0u8; words];
        let mut total = 0u64;
        for w in 0..words {
            if w % SUPER_FACTOR == 0 {
                rs[w / SUPER_FACTOR] = total;
            }
            rb[w] = (total - rs[w / SUPER_FACTOR]) as u8;
            total += u64::from(data[w].count_ones());
        }

        Self { data, n, rs, rb, ones: total }
    }

    /// 位长度
    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// 总置位数
    pub fn count_ones(&self) -> u64 {
        self.ones
    }

    /// [0, i] 内置位数，要求 i < n
    pub fn rank(&self, i: u64) -> u64 {
        let i = i as usize;
        let word = i / 64;
        let mask = !0u64 >> (63 - (i % 64) as u32);
        self.rs[i / 256]
            + u64::from(self.rb[word])
            + u64::from((self.data[word] & mask).count_ones())
    }

    /// [0, i] 内零位数
    pub fn rank0(&self, i: u64) -> u64 {
        i + 1 - self.rank(i)
    }

    /// 按目标位取 rank：true 数 1，false 数 0
    pub fn rank_bit(&self, bit: bool, i: u64) -> u64 {
        if bit {
            self.rank(i)
        } else {
            i + 1 - self.rank(i)
        }
    }

    /// 第 i 位是否置位，不经过计数结构
    pub fn is_bit_set(&self, i: u64) -> bool {
        (self.data[(i / 64) as usize] >> (i % 64)) & 1 != 0
    }

    /// 第 x 个置位的位置（x 从 1 起）；x 为 0 或超过总置位数时返回 None
    pub fn select(&self, x: u64) -> Option<u64> {
        if x == 0 || x > self.ones {
            return None;
        }
        // rs 单调不减，二分找最后一个 rs[s] < x 的超块
        let s = self.rs.partition_point(|&r| r < x) - 1;
        let base = s * SUPER_FACTOR;
        let last = (base + SUPER_FACTOR).min(self.rb.len());
        let mut w = base;
        while w + 1 < last && self.rs[s] + u64::from(self.rb[w + 1]) < x {
            w += 1;
        }
        let mut remaining = x - self.rs[s] - u64::from(self.rb[w]);
        let mut word = self.data[w];
        while remaining > 1 {
            word &= word - 1;
            remaining -= 1;
        }
        debug_assert_ne!(word, 0);
        Some((w * 64) as u64 + u64::from(word.trailing_zeros()))
    }

    /// 第 x 个零位的位置（x 从 1 起）
    pub fn select0(&self, x: u64) -> Option<u64> {
        if x == 0 || x > self.n - self.ones {
            return None;
        }
        // 零数随超块序号单调，显式二分找最后一个 zeros_before < x 的超块
        let mut lo = 0usize;
        let mut hi = self.rs.len();
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            let zeros_before = (mid as u64) * 256 - self.rs[mid];
            if zeros_before < x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let s = lo;
        let target = x - ((s as u64) * 256 - self.rs[s]);
        let base = s * SUPER_FACTOR;
        let last = (base + SUPER_FACTOR).min(self.rb.len());
        let mut w = base;
        while w + 1 < last
            && ((w + 1 - base) as u64) * 64 - u64::from(self.rb[w + 1]) < target
        {
            w += 1;
        }
        let mut remaining = target - (((w - base) as u64) * 64 - u64::from(self.rb[w]));
        let mut word = !self.data[w];
        while remaining > 1 {
            word &= word - 1;
            remaining -= 1;
        }
        debug_assert_ne!(word, 0);
        Some((w * 64) as u64 + u64::from(word.trailing_zeros()))
    }

    /// 序列化：位长、位数组、超块计数、块计数依次写出；
    /// 装载端直接回灌计数器，不重建。
    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        serial::write_u64(w, self.n, "BitRank n")?;
        serial::write_u64_slice(w, &self.data, "BitRank data")?;
        serial::write_u64_slice(w, &self.rs, "BitRank Rs")?;
        w.write_all(&self.rb)
            .context("file write error (BitRank Rb)")?;
        Ok(())
    }

    pub fn load<R: Read>(r: &mut R) -> Result<Self> {
        let n = serial::read_u64(r, "BitRank n")?;
        let words = serial::checked_len((n + 63) / 64, "BitRank data")?;
        let supers = serial::checked_len(((n + 255) / 256).max(1), "BitRank Rs")?;
        let data = serial::read_u64_vec(r, words, "BitRank data")?;
        let rs = serial::read_u64_vec(r, supers, "BitRank Rs")?;
        let rb = serial::read_bytes(r, words, "BitRank Rb")?;
        let ones = if n == 0 {
            0
        } else {
            let i = (n - 1) as usize;
            let word = i / 64;
            let mask = !0u64 >> (63 - (i % 64) as u32);
            rs[i / 256] + u64::from(rb[word]) + u64::from((data[word] & mask).count_ones())
        };
        Ok(Self { data, n, rs, rb, ones })
    }
}
