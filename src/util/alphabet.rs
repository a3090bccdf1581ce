/// 索引使用的符号表配置。
///
/// FM 索引本身对 0..=255 的任意字节有效；`Alphabet` 只在正向抽取
/// （C 桶扫描）时限定合法符号集合，并作为显式配置传入，
/// 避免进程级常量把 DNA 与 color-code 两套字母表锁死。
#[derive(Debug, Clone)]
pub struct Alphabet {
    /// 升序的合法符号，含 0 终止符
    symbols: Vec<u8>,
}

impl Alphabet {
    /// 自定义符号集；自动补入终止符并升序去重
    pub fn new(mut symbols: Vec<u8>) -> Self {
        symbols.push(0);
        symbols.sort_unstable();
        symbols.dedup();
        Self { symbols }
    }

    /// 读集索引的缺省符号表：终止符、若干标点/数字（color-code 读）、
    /// DNA 与 IUPAC 常见碱基
    pub fn dna() -> Self {
        Self {
            symbols: vec![
                0, b' ', b'#', b'.', b'0', b'1', b'2', b'3', b'A', b'C', b'G', b'M', b'N',
                b'R', b'T',
            ],
        }
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn contains(&self, b: u8) -> bool {
        self.symbols.binary_search(&b).is_ok()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::dna()
    }
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

/// 碱基归一化：大写、U→T、未知字符一律 N
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        let nb = match up {
            b'A' | b'C' | b'G' | b'T' | b'N' => up,
            b'U' => b'T',
            _ => b'N',
        };
        out.push(nb);
    }
    out
}
