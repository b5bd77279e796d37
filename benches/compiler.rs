use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xlbrl::{Cell, CompileConfig, Compiler, Sheet, Workbook};

fn text(s: &str) -> Cell {
    Cell::from(s)
}

fn synthetic_workbook(sections: usize, rows_per_section: usize) -> Workbook {
    let control = Sheet::from_rows(
        "control",
        vec![
            vec![text("action")],
            vec![text("extension"), text("schema"), text("ext"), text("ext.xsd"), text("http://x/ext")],
            vec![text("extension"), text("linkbase"), text("presentation"), text("ext-pre.xml")],
            vec![text("extension"), text("linkbase"), text("definition"), text("ext-def.xml")],
            vec![text("extension"), text("linkbase"), text("calculation"), text("ext-cal.xml")],
            vec![text("extension"), text("linkbase"), text("label"), text("ext-lab-en.xml")],
        ],
    );

    let mut rows = Vec::new();
    for section in 0..sections {
        rows.push(vec![text(&format!("http://x/role/Section{}", section))]);
        rows.push(
            ["prefix", "name", "type", "depth", "calculation parent", "calculation weight", "label"]
                .iter()
                .map(|s| text(s))
                .collect(),
        );
        for row in 0..rows_per_section {
            let name = format!("Item{}_{}", section, row);
            rows.push(vec![
                text("ext"),
                text(&name),
                text("xbrli:monetaryItemType"),
                Cell::Int((row % 4) as i64),
                text(&format!("ext:Total{}", section)),
                Cell::Float(1.0),
                text(&format!("Item {} of section {}", row, section)),
            ]);
        }
    }
    Workbook::from_sheets(vec![Sheet::from_rows("data", rows), control])
}

fn compile_synthetic(c: &mut Criterion) {
    let compiler = Compiler::with_config(CompileConfig {
        discover_imports: false,
        ..CompileConfig::default()
    });

    let small = synthetic_workbook(4, 50);
    c.bench_function("compile_200_rows", |b| {
        b.iter(|| compiler.compile_workbook(black_box(&small)));
    });

    let large = synthetic_workbook(20, 500);
    c.bench_function("compile_10000_rows", |b| {
        b.iter(|| compiler.compile_workbook(black_box(&large)));
    });
}

criterion_group!(benches, compile_synthetic);
criterion_main!(benches);
