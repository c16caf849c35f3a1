mod parsers;

use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;
use xpssynth::XpsDb;
use xpssynth_data::{SampleTable, ShellDatabase, VersionRecord, spin_orbit_fraction};

/// Usage: `xpssynth-generate [DATA_DIR] [OUT_FILE]`
///
/// `DATA_DIR` defaults to `<workspace>/database` and holds one tab-separated
/// table per orbital (`ne1s.txt`, `ar2p.txt`, ...). Shells without a table get
/// the placeholder samples.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or("manifest directory has no parent")?;
    let mut args = std::env::args_os().skip(1);
    let data_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.join("database"));
    let out_path = args.next().map(PathBuf::from).unwrap_or_else(|| {
        root.join("xpssynth-lib")
            .join("data")
            .join("xpssynth.bin.zst")
    });

    if !data_dir.exists() {
        tracing::warn!(dir = %data_dir.display(), "data directory not found, every shell uses placeholder samples");
    }
    println!("Reading shell tables from {:?}...", data_dir);

    // Shell catalog (names, binding energies, Auger lines) comes from the built-in table
    let mut db: ShellDatabase = XpsDb::new().raw().clone();
    let mut tables: HashMap<String, SampleTable> = HashMap::new();
    let mut missing = 0;

    for element in &mut db.elements {
        element.samples = Vec::with_capacity(element.shells.len());
        for shell in &element.shells {
            let stem = parsers::table_stem(&element.symbol, &shell.name);
            let table = match tables.get(&stem) {
                Some(t) => t.clone(),
                None => {
                    let path = data_dir.join(format!("{stem}.txt"));
                    let t = if path.exists() {
                        parsers::parse_shell_table(&path)?
                    } else {
                        tracing::warn!(file = %path.display(), "missing table, using placeholder samples");
                        missing += 1;
                        SampleTable::placeholder()
                    };
                    tables.insert(stem, t.clone());
                    t
                }
            };
            element.samples.push(table.scaled(spin_orbit_fraction(&shell.name)));
        }
        println!(
            "  {}: {} shells, {} Auger lines",
            element.name,
            element.shells.len(),
            element.auger.len()
        );
    }
    println!("  Tables: {} read, {} placeholders", tables.len() - missing, missing);

    let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    db.version = vec![VersionRecord {
        tag: env!("CARGO_PKG_VERSION").to_string(),
        date: format!("unix:{stamp}"),
        notes: format!("generated from {}", data_dir.display()),
    }];

    println!("\nSerializing with postcard...");
    let serialized = postcard::to_allocvec(&db)?;
    println!("  Serialized size: {} bytes", serialized.len());

    println!("Compressing with zstd (level 19)...");
    let compressed = zstd::encode_all(&serialized[..], 19)?;
    println!(
        "  Compressed size: {} bytes ({:.1}x)",
        compressed.len(),
        serialized.len() as f64 / compressed.len() as f64
    );

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::File::create(&out_path)?;
    f.write_all(&compressed)?;
    println!("\nWrote {:?}", out_path);

    println!("Verifying round-trip deserialization...");
    let decompressed = zstd::decode_all(&compressed[..])?;
    if decompressed != serialized {
        return Err("decompressed bytes differ from serialized bytes".into());
    }
    let restored: ShellDatabase = postcard::from_bytes(&decompressed)?;
    if restored.elements.len() != db.elements.len() {
        return Err("round-trip lost elements".into());
    }
    println!("  Round-trip OK!");
    Ok(())
}
