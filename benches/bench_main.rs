use std::fmt::Write;

use criterion::{Criterion, criterion_group, criterion_main};
use viared::loading::package;
use viared::{ImportConfig, NetworkPackage, import_network};

/// Square grid of one-way link pairs, the worst case for permissive turn
/// inference (every interior node is a four-way crossing).
fn grid_package(size: usize) -> NetworkPackage {
    let mut base = String::from("t nodes\n");
    for row in 0..size {
        for col in 0..size {
            let id = row * size + col + 1;
            let _ = writeln!(base, "a {id} {}.0 {}.0 0 0 0", col * 100, row * 100);
        }
    }
    base.push_str("t links\n");
    for row in 0..size {
        for col in 0..size {
            let id = row * size + col + 1;
            if col + 1 < size {
                link_pair(&mut base, id, id + 1);
            }
            if row + 1 < size {
                link_pair(&mut base, id, id + size);
            }
        }
    }
    NetworkPackage::from_sections([
        (package::MODES, "t modes\na c 'Car' 1\n".to_string()),
        (package::BASE_NETWORK, base),
    ])
}

fn link_pair(base: &mut String, from: usize, to: usize) {
    let _ = writeln!(base, "a {from} {to} 0.1 c 1 2 0 0 50 800");
    let _ = writeln!(base, "a {to} {from} 0.1 c 1 2 0 0 50 800");
}

fn bench_import(c: &mut Criterion) {
    let package = grid_package(20);
    let config = ImportConfig::default();
    c.bench_function("import_grid_20x20", |b| {
        b.iter(|| import_network(&package, &config).unwrap());
    });
}

criterion_group!(benches, bench_import);
criterion_main!(benches);
