//! Drives the manager through a whole session using only the public API.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use spectrum::plugins::{EntryPoints, Plugin, PluginHost, StaticModules, Updatable};
use spectrum::scripts::ScriptHandle;
use spectrum::{
    FailureSource, Hotkey, Manager, ManagerConfig, ManagerError, ManagerState, PressedKeys,
    SubsystemLog,
};
use tempfile::tempdir;

type Journal = Rc<RefCell<Vec<String>>>;

thread_local! {
    static PLUGIN_JOURNAL: Journal = Journal::default();
}

fn plugin_journal() -> Journal {
    PLUGIN_JOURNAL.with(Rc::clone)
}

/// Counts updates and binds `Ctrl+M` to a marker action.
struct Minimap {
    journal: Journal,
}

impl Default for Minimap {
    fn default() -> Self {
        Self {
            journal: plugin_journal(),
        }
    }
}

impl Plugin for Minimap {
    fn friendly_name(&self) -> &str {
        "Minimap"
    }

    fn author(&self) -> &str {
        "integration"
    }

    fn compatible_api_level(&self) -> u32 {
        1
    }

    fn initialize(&mut self, host: &mut dyn PluginHost) -> anyhow::Result<()> {
        let journal = self.journal.clone();
        host.add_hotkey(
            Hotkey::parse("Ctrl+M")?,
            Box::new(move || {
                journal.borrow_mut().push("minimap:toggle".to_string());
                Ok(())
            }),
        )?;
        host.log().info("Minimap ready");
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.journal.borrow_mut().push("minimap:shutdown".to_string());
        Ok(())
    }

    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        Some(self)
    }
}

impl Updatable for Minimap {
    fn update(&mut self) -> anyhow::Result<()> {
        self.journal.borrow_mut().push("minimap:update".to_string());
        Ok(())
    }
}

/// Declares a newer API level than the host supports.
#[derive(Default)]
struct FromTheFuture;

impl Plugin for FromTheFuture {
    fn friendly_name(&self) -> &str {
        "FromTheFuture"
    }

    fn author(&self) -> &str {
        "integration"
    }

    fn compatible_api_level(&self) -> u32 {
        2
    }

    fn initialize(&mut self, _host: &mut dyn PluginHost) -> anyhow::Result<()> {
        anyhow::bail!("must never be initialized")
    }
}

fn minimap(entries: &mut EntryPoints) {
    entries.register(|| Box::new(Minimap::default()));
}

fn from_the_future(entries: &mut EntryPoints) {
    entries.register(|| Box::new(FromTheFuture));
}

#[test]
fn test_full_session() {
    let temp = tempdir().unwrap();
    let config = ManagerConfig {
        log_file: Some(temp.path().join("logs").join("spectrum.log")),
        ..ManagerConfig::with_root(temp.path())
    };
    let log_path = config.log_file.clone().unwrap();

    fs::create_dir_all(&config.on_demand_script_dir).unwrap();
    fs::create_dir_all(&config.plugin_dir).unwrap();
    fs::create_dir_all(&config.settings_dir).unwrap();
    fs::write(config.script_dir.join("startup.lua"), "print('hi')").unwrap();
    fs::write(config.on_demand_script_dir.join("toggle.lua"), "toggle()").unwrap();
    fs::write(
        config.settings_dir.join("Manager.Hotkeys.toml"),
        "F1 = \"toggle.lua\"\n",
    )
    .unwrap();

    let scripts = Journal::default();
    let ran = scripts.clone();
    let log = SubsystemLog::new(&log_path, false).unwrap();

    let mut manager = Manager::builder(config)
        .script_runtime(move |script: &ScriptHandle| -> anyhow::Result<()> {
            ran.borrow_mut().push(script.id().to_string());
            Ok(())
        })
        .module_scanner(
            StaticModules::new()
                .with_module("minimap", minimap)
                .with_module("future", from_the_future),
        )
        .log(log)
        .build();

    assert!(matches!(
        manager.update(&PressedKeys::new()),
        Err(ManagerError::NotRunning(ManagerState::Uninitialized))
    ));

    manager.start();
    assert_eq!(manager.state(), ManagerState::Running);
    assert_eq!(*scripts.borrow(), vec!["startup.lua"]);

    // The incompatible module is skipped, the other one loads.
    let ids: Vec<&str> = manager.plugins().ids().collect();
    assert_eq!(ids, vec!["minimap"]);

    // F1 runs the on-demand script exactly once and no action fires.
    let input: PressedKeys = [Hotkey::parse("F1").unwrap()].into_iter().collect();
    let report = manager.update(&input).unwrap();
    assert_eq!(report.scripts_executed, 1);
    assert_eq!(report.actions_invoked, 0);
    assert_eq!(report.plugins_updated, 1);
    assert!(report.failures.is_empty());
    assert_eq!(*scripts.borrow(), vec!["startup.lua", "toggle.lua"]);

    // Host input as a closure.
    let ctrl_m = Hotkey::parse("ctrl+m").unwrap();
    let report = manager
        .update(&|hotkey: &Hotkey| *hotkey == ctrl_m)
        .unwrap();
    assert_eq!(report.actions_invoked, 1);

    // F1 already belongs to a script.
    manager.add_hotkey(Hotkey::parse("F2").unwrap(), "host", Box::new(|| Ok(()))).unwrap();
    let conflict = manager.add_hotkey(Hotkey::parse("F1").unwrap(), "host", Box::new(|| Ok(())));
    assert!(conflict.is_err());

    manager.shutdown();
    assert_eq!(manager.state(), ManagerState::Stopped);

    let events = plugin_journal().borrow().clone();
    assert_eq!(
        events,
        vec![
            "minimap:update",
            "minimap:toggle",
            "minimap:update",
            "minimap:shutdown"
        ]
    );

    let log_text = fs::read_to_string(&log_path).unwrap();
    assert!(log_text.contains("Minimap ready"));
    assert!(log_text.contains("future"));
    assert!(log_text.contains("Spectrum will not re-assign this hotkey."));
}

#[test]
fn test_missing_script_hotkey_target_is_isolated() {
    let temp = tempdir().unwrap();
    let config = ManagerConfig {
        log_file: None,
        ..ManagerConfig::with_root(temp.path())
    };
    fs::create_dir_all(&config.script_dir).unwrap();
    fs::create_dir_all(&config.settings_dir).unwrap();
    fs::write(
        config.settings_dir.join("Manager.Hotkeys.toml"),
        "F5 = \"gone.lua\"\n",
    )
    .unwrap();

    let mut manager = Manager::builder(config)
        .script_runtime(|_: &ScriptHandle| -> anyhow::Result<()> { Ok(()) })
        .module_scanner(StaticModules::new())
        .log(SubsystemLog::silent())
        .build();
    manager.start();

    let input: PressedKeys = [Hotkey::parse("F5").unwrap()].into_iter().collect();
    let report = manager.update(&input).unwrap();

    assert_eq!(report.scripts_executed, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].source,
        FailureSource::Script { ref script, .. } if script == "gone.lua"
    ));
}
