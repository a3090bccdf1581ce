//! 演示如何在 library 模式下使用 readfm 索引并查询一组读。
//!
//! 运行方式：
//! ```bash
//! cargo run --example search_reads
//! ```

use readfm::CollectionBuilder;

fn main() -> anyhow::Result<()> {
    // 1. 插入读集
    let reads: &[&[u8]] = &[
        b"ACGTACGTAGCTGATCGTAG",
        b"TTGCAACGGATTACAGGCAT",
        b"GATTACAGATTACATTAGGC",
    ];
    let mut builder = CollectionBuilder::new(4);
    for (i, read) in reads.iter().enumerate() {
        builder.insert_named_text(read, &format!("read{i}"))?;
    }

    // 2. 构建索引与采样结构
    let mut fm = builder.finish()?;
    fm.build_samples();
    println!("索引构建完成：总长={}, 文档数={}", fm.get_length(), fm.number_of_texts());

    // 3. 计数查询
    let pattern = b"GATTACA";
    println!("\n计数 '{}': {}", std::str::from_utf8(pattern).unwrap(), fm.count(pattern));

    // 4. 位置恢复
    if let Some((sp, ep)) = fm.search(pattern) {
        let mut occ = fm.get_occurrences(sp, ep)?;
        occ.sort_unstable();
        for (doc, offset) in occ {
            println!("  {} 偏移 {}", fm.get_name(doc).unwrap_or("?"), offset);
        }
    }

    // 5. 后缀抽取与文档枚举
    if let Some((sp, _)) = fm.search(b"TTGCAACG") {
        let text = fm.get_suffix(sp, 20);
        println!("\nread1 前 20 字节：{}", String::from_utf8_lossy(&text));
    }

    let mut out = Vec::new();
    let nreads = fm.output_reads(&mut out, |_| true)?;
    println!("\n全量导出 {nreads} 条：");
    print!("{}", String::from_utf8_lossy(&out));
    Ok(())
}
