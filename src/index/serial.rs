use anyhow::{anyhow, bail, Context, Result};
use std::io::{Read, Write};

/// 二进制索引文件的定宽字段读写。
/// 所有整数按本机字节序写入，与保存格式约定一致；每个失败的字段
/// 在错误信息中带上字段名，便于定位损坏位置。

pub fn write_u8<W: Write>(w: &mut W, v: u8, field: &str) -> Result<()> {
    w.write_all(&[v])
        .with_context(|| format!("file write error ({field})"))
}

pub fn write_u32<W: Write>(w: &mut W, v: u32, field: &str) -> Result<()> {
    w.write_all(&v.to_ne_bytes())
        .with_context(|| format!("file write error ({field})"))
}

pub fn write_u64<W: Write>(w: &mut W, v: u64, field: &str) -> Result<()> {
    w.write_all(&v.to_ne_bytes())
        .with_context(|| format!("file write error ({field})"))
}

pub fn write_bool<W: Write>(w: &mut W, v: bool, field: &str) -> Result<()> {
    write_u8(w, u8::from(v), field)
}

pub fn write_u64_slice<W: Write>(w: &mut W, vs: &[u64], field: &str) -> Result<()> {
    for &v in vs {
        write_u64(w, v, field)?;
    }
    Ok(())
}

pub fn read_u8<R: Read>(r: &mut R, field: &str) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)
        .with_context(|| format!("file read error ({field})"))?;
    Ok(buf[0])
}

pub fn read_u32<R: Read>(r: &mut R, field: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .with_context(|| format!("file read error ({field})"))?;
    Ok(u32::from_ne_bytes(buf))
}

pub fn read_u64<R: Read>(r: &mut R, field: &str) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)
        .with_context(|| format!("file read error ({field})"))?;
    Ok(u64::from_ne_bytes(buf))
}

pub fn read_bool<R: Read>(r: &mut R, field: &str) -> Result<bool> {
    Ok(read_u8(r, field)? != 0)
}

pub fn read_u64_vec<R: Read>(r: &mut R, len: usize, field: &str) -> Result<Vec<u64>> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(read_u64(r, field)?);
    }
    Ok(out)
}

pub fn read_bytes<R: Read>(r: &mut R, len: usize, field: &str) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .with_context(|| format!("file read error ({field})"))?;
    Ok(buf)
}

/// 旧版本兼容的字段宽度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U32,
    U64,
}

impl FieldWidth {
    pub fn read<R: Read>(self, r: &mut R, field: &str) -> Result<u64> {
        match self {
            FieldWidth::U32 => Ok(u64::from(read_u32(r, field)?)),
            FieldWidth::U64 => read_u64(r, field),
        }
    }
}

/// 按保存文件版本号选定各字段的解码宽度，装载开始时确定一次，
/// 读取路径不再分散判断版本。
///
/// v14: C 表项为 u32；v15: C 表改 u64；v16: 码表 count 改 u64；
/// v17: 采样位图改用 BitRank（当前版本）。
#[derive(Debug, Clone, Copy)]
pub struct VersionCodec {
    pub version: u8,
    pub c_entry: FieldWidth,
    pub code_count: FieldWidth,
    pub samples_supported: bool,
}

pub const VERSION_FLAG: u8 = 17;

impl VersionCodec {
    pub fn for_version(version: u8) -> Result<Self> {
        match version {
            14 => Ok(Self {
                version,
                c_entry: FieldWidth::U32,
                code_count: FieldWidth::U32,
                samples_supported: false,
            }),
            15 => Ok(Self {
                version,
                c_entry: FieldWidth::U64,
                code_count: FieldWidth::U32,
                samples_supported: false,
            }),
            16 => Ok(Self {
                version,
                c_entry: FieldWidth::U64,
                code_count: FieldWidth::U64,
                samples_supported: false,
            }),
            VERSION_FLAG => Ok(Self {
                version,
                c_entry: FieldWidth::U64,
                code_count: FieldWidth::U64,
                samples_supported: true,
            }),
            _ => Err(anyhow!("invalid save file version ({version})")),
        }
    }
}

/// 长度字段转 usize，过大视为格式错误（截断文件常见症状）。
pub fn checked_len(v: u64, field: &str) -> Result<usize> {
    if v > usize::MAX as u64 {
        bail!("file read error ({field}): length {v} out of range");
    }
    Ok(v as usize)
}
