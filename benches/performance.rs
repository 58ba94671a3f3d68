//! Performance benchmarks for Spectrum.
//!
//! Run with: cargo bench
//!
//! Target performance:
//! - Hotkey parsing: < 1µs
//! - Idle tick with 50 plugins: < 10µs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spectrum::plugins::{EntryPoints, Plugin, PluginHost, StaticModules, Updatable};
use spectrum::{Hotkey, HotkeyAction, Manager, ManagerConfig, PressedKeys, SubsystemLog};

#[derive(Default)]
struct Ticker {
    ticks: u64,
}

impl Plugin for Ticker {
    fn friendly_name(&self) -> &str {
        "Ticker"
    }

    fn author(&self) -> &str {
        "bench"
    }

    fn compatible_api_level(&self) -> u32 {
        spectrum::API_LEVEL
    }

    fn initialize(&mut self, _host: &mut dyn PluginHost) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        Some(self)
    }
}

impl Updatable for Ticker {
    fn update(&mut self) -> anyhow::Result<()> {
        self.ticks = self.ticks.wrapping_add(1);
        Ok(())
    }
}

fn register_ticker(entries: &mut EntryPoints) {
    entries.register(|| Box::new(Ticker::default()));
}

/// Benchmark hotkey parsing.
fn bench_hotkey_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("hotkey_parse");

    let inputs = [
        ("single", "F1"),
        ("chord", "Ctrl+Shift+K"),
        ("aliases", "leftcontrol+option+pagedown"),
    ];

    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| black_box(Hotkey::parse(black_box(input))))
        });
    }

    group.finish();
}

/// Benchmark the per-tick dispatch path.
fn bench_update(c: &mut Criterion) {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = ManagerConfig {
        log_file: None,
        ..ManagerConfig::with_root(temp.path())
    };
    std::fs::create_dir_all(&config.plugin_dir).expect("plugin dir");

    let mut modules = StaticModules::new();
    for i in 0..50 {
        modules = modules.with_module(format!("ticker-{i}"), register_ticker);
    }

    let mut manager = Manager::builder(config)
        .module_scanner(modules)
        .log(SubsystemLog::silent())
        .build();
    manager.start();

    let mut group = c.benchmark_group("update");

    let idle = PressedKeys::new();
    group.bench_function("idle_50_plugins", |b| {
        b.iter(|| black_box(manager.update(&idle)))
    });

    for i in 1..=12 {
        let hotkey = Hotkey::parse(&format!("F{i}")).expect("hotkey");
        let action: HotkeyAction = Box::new(|| Ok(()));
        let _ = manager.add_hotkey(hotkey, "bench", action);
    }
    let pressed: PressedKeys = ["F1", "F6", "F12"]
        .iter()
        .filter_map(|k| Hotkey::parse(k).ok())
        .collect();
    group.bench_function("three_actions_50_plugins", |b| {
        b.iter(|| black_box(manager.update(&pressed)))
    });

    group.finish();
}

criterion_group!(benches, bench_hotkey_parse, bench_update);

criterion_main!(benches);
