use anyhow::{ensure, Result};

use super::bwt::build_bwt;
use super::fm::FMIndex;
use super::sa::build_sa;
use crate::util::alphabet::Alphabet;

/// 集合构建器：逐条插入序列，`finish` 一次性产出 FM 索引。
///
/// 插入阶段只做拼接与统计（文档数、最长文档），后缀数组/BWT 的构建
/// 推迟到 `finish`。`finish` 按值消费构建器，天然挡掉“建完再插”。
pub struct CollectionBuilder {
    samplerate: u32,
    text: Vec<u8>,
    names: Vec<String>,
    number_of_texts: u32,
    /// 最长文档长度（含终止符）
    max_text_length: u64,
    alphabet: Alphabet,
    color_coded: bool,
    rotation_length: u32,
}

impl CollectionBuilder {
    /// `samplerate` 传 0 用缺省采样率
    pub fn new(samplerate: u32) -> Self {
        Self {
            samplerate,
            text: Vec::new(),
            names: Vec::new(),
            number_of_texts: 0,
            max_text_length: 0,
            alphabet: Alphabet::dna(),
            color_coded: false,
            rotation_length: 0,
        }
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_color_coded(mut self, color_coded: bool) -> Self {
        self.color_coded = color_coded;
        self
    }

    pub fn with_rotation_length(mut self, rotation_length: u32) -> Self {
        self.rotation_length = rotation_length;
        self
    }

    /// 插入一条序列。空序列与含 0 字节的序列不可索引。
    pub fn insert_text(&mut self, seq: &[u8]) -> Result<()> {
        ensure!(!seq.is_empty(), "can not index empty texts");
        ensure!(
            !seq.contains(&0),
            "text contains a 0 byte, which is reserved for end-markers"
        );
        let m = seq.len() as u64 + 1;
        if m > self.max_text_length {
            self.max_text_length = m;
        }
        self.text.extend_from_slice(seq);
        self.text.push(0);
        self.number_of_texts += 1;
        Ok(())
    }

    /// 插入带名称的序列。命名与匿名插入不可混用（finish 时校验）。
    pub fn insert_named_text(&mut self, seq: &[u8], name: &str) -> Result<()> {
        self.names.push(name.to_string());
        self.insert_text(seq)
    }

    pub fn number_of_texts(&self) -> u32 {
        self.number_of_texts
    }

    pub fn total_length(&self) -> u64 {
        self.text.len() as u64
    }

    /// 构建索引：后缀数组 → 伪 BWT → FM 索引
    pub fn finish(self) -> Result<FMIndex> {
        ensure!(self.number_of_texts > 0, "can not build an index over zero texts");
        ensure!(
            self.names.is_empty() || self.names.len() == self.number_of_texts as usize,
            "named and unnamed inserts were mixed"
        );
        let sa = build_sa(&self.text);
        let bwt = build_bwt(&self.text, &sa);
        drop(sa);
        drop(self.text);
        FMIndex::new(
            bwt,
            self.samplerate,
            self.number_of_texts,
            self.max_text_length,
            self.names,
            self.alphabet,
            self.color_coded,
            self.rotation_length,
        )
    }
}
