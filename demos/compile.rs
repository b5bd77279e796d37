//! Basic compile example

use std::env;
use xlbrl::{load_from_workbook, CompileConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <workbook> [output-dir]", args[0]);
        std::process::exit(1);
    }

    let Some(taxonomy) = load_from_workbook(&args[1], CompileConfig::default())? else {
        eprintln!("{} is not a workbook", args[1]);
        std::process::exit(1);
    };

    println!("Compiled {} successfully", args[1]);
    println!("  Entry schema: {}", taxonomy.entry_uri());
    for linkbase in taxonomy.linkbase_refs() {
        println!("  Linkbase: {}", linkbase);
    }

    // Show first 5 diagnostics
    for diagnostic in taxonomy.diagnostics().iter().take(5) {
        println!("  - {}", diagnostic);
    }

    if let Some(dir) = args.get(2) {
        for path in taxonomy.save(dir)? {
            println!("  Wrote {}", path.display());
        }
    }

    Ok(())
}
