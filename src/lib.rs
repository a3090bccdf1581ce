//! # readfm
//!
//! 读集（reads collection）上的压缩 FM 自索引。
//!
//! 不保存明文，直接在 BWT 上支持：
//!
//! - **精确子串计数**：backward search，O(模式长)，与文本规模无关
//! - **位置恢复**：后缀采样 + LF 回走，返回 (文档号, 文档内偏移)
//! - **文档枚举 / 后缀抽取**：按行或按文档重建原文
//! - **版本化持久化**：主索引 `.fmi` + 采样伴随文件 `.sa`，
//!   兼容装载旧版 v14/v15/v16 文件
//!
//! 核心由三层结构组成：rank/select 位向量（[`index::bitrank`]）、
//! Huffman 形状的 wavelet tree（[`index::huffwt`]）、FM 索引层
//! （[`index::fm`]）。构建一次后只读，查询路径不加锁，可被任意多
//! 线程并发访问。
//!
//! ## 快速示例
//!
//! ```rust
//! use readfm::CollectionBuilder;
//!
//! let mut builder = CollectionBuilder::new(4);
//! builder.insert_named_text(b"ACGTACGT", "read0").unwrap();
//! builder.insert_named_text(b"TTGCAACG", "read1").unwrap();
//! let mut fm = builder.finish().unwrap();
//!
//! // 计数查询（无需采样结构）
//! assert_eq!(fm.count(b"ACG"), 3);
//! assert_eq!(fm.count(b"GGGG"), 0);
//!
//! // 位置恢复需要先构建采样
//! fm.build_samples();
//! let (sp, ep) = fm.search(b"TTGC").unwrap();
//! let occ = fm.get_occurrences(sp, ep).unwrap();
//! assert_eq!(occ, vec![(1, 0)]);
//! ```
//!
//! ## 模块说明
//!
//! - [`index`] — 位向量、wavelet tree、FM 索引、SA/BWT 构建、集合构建器
//! - [`io`] — line / FASTA / FASTQ 输入读取
//! - [`util`] — 符号表配置与碱基归一化

pub mod index;
pub mod io;
pub mod util;

pub use index::builder::CollectionBuilder;
pub use index::fm::FMIndex;
pub use util::alphabet::Alphabet;
