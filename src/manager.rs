//! The orchestrator the host drives.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ─► SettingsLoaded ─► [ScriptsLoaded ─► ScriptsStarted]
//!               ─► [PluginsLoaded ─► PluginsStarted] ─► Running ─► Stopped
//! ```
//!
//! Bracketed states are skipped when the matching settings switch is off or
//! the directory does not exist. Every transition happens once, inside
//! [`Manager::start`], before the host begins ticking.
//!
//! # Tick
//!
//! [`Manager::update`] runs, in this order: scripts bound to pressed hotkeys,
//! actions bound to pressed hotkeys, then every enabled and updatable plugin
//! in container order. Each entry is isolated; a failure is logged, recorded
//! in the [`TickReport`] and the tick carries on.

use std::fmt;

use crate::config::ManagerConfig;
use crate::dispatch::{isolate, DispatchFailure, FailureSource, TickReport};
use crate::error::{ManagerError, ManagerResult};
use crate::hotkeys::{Hotkey, HotkeyAction, HotkeyError, HotkeyRegistry, InputSource};
use crate::logging::SubsystemLog;
use crate::plugins::{DylibScanner, ModuleScanner, PluginContainer, PluginHost, PluginLoader};
use crate::scripts::{InterpreterRuntime, ScriptExecutor, ScriptLoader, ScriptRuntime};
use crate::settings::Settings;

/// Settings owner name for the manager's own files.
pub const SETTINGS_OWNER: &str = "Manager";
/// Settings section mapping hotkeys to script identifiers.
pub const HOTKEYS_SECTION: &str = "Hotkeys";

const LOAD_SCRIPTS_KEY: &str = "LoadScripts";
const LOAD_PLUGINS_KEY: &str = "LoadPlugins";
const FIRST_RUN_KEY: &str = "FirstRun";

const NOT_REASSIGNED: &str = "Spectrum will not re-assign this hotkey.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    SettingsLoaded,
    ScriptsLoaded,
    ScriptsStarted,
    PluginsLoaded,
    PluginsStarted,
    Running,
    Stopped,
}

/// The two subsystem switches read from the manager settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switches {
    pub load_scripts: bool,
    pub load_plugins: bool,
}

impl Default for Switches {
    fn default() -> Self {
        Self {
            load_scripts: true,
            load_plugins: true,
        }
    }
}

/// Configures collaborators before the manager is built.
pub struct ManagerBuilder {
    config: ManagerConfig,
    runtime: Option<Box<dyn ScriptRuntime>>,
    scanner: Option<Box<dyn ModuleScanner>>,
    log: Option<SubsystemLog>,
}

impl ManagerBuilder {
    /// Runtime used to execute scripts. Defaults to the `lua` interpreter.
    pub fn script_runtime(mut self, runtime: impl ScriptRuntime + 'static) -> Self {
        self.runtime = Some(Box::new(runtime));
        self
    }

    /// Where plugin modules come from. Defaults to dynamic libraries in the plugin directory.
    pub fn module_scanner(mut self, scanner: impl ModuleScanner + 'static) -> Self {
        self.scanner = Some(Box::new(scanner));
        self
    }

    /// Log to use instead of the one described by the configuration.
    pub fn log(mut self, log: SubsystemLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn build(self) -> Manager {
        let log = self.log.unwrap_or_else(|| default_log(&self.config));
        let runtime = self
            .runtime
            .unwrap_or_else(|| Box::new(InterpreterRuntime::lua()));
        let scanner = self
            .scanner
            .unwrap_or_else(|| Box::new(DylibScanner::new()));

        Manager {
            config: self.config,
            state: ManagerState::Uninitialized,
            history: Vec::new(),
            log,
            settings: None,
            switches: Switches::default(),
            hotkeys: HotkeyRegistry::new(),
            runtime: Some(runtime),
            scripts: None,
            scanner,
            plugins: PluginContainer::new(),
        }
    }
}

fn default_log(config: &ManagerConfig) -> SubsystemLog {
    let fallback = || {
        if config.log_to_console {
            SubsystemLog::console_only()
        } else {
            SubsystemLog::silent()
        }
    };

    match &config.log_file {
        Some(path) => SubsystemLog::new(path, config.log_to_console).unwrap_or_else(|e| {
            tracing::warn!("Failed to create log file {}: {}", path.display(), e);
            fallback()
        }),
        None => fallback(),
    }
}

/// Owns every extension and routes host ticks to them.
pub struct Manager {
    config: ManagerConfig,
    state: ManagerState,
    history: Vec<ManagerState>,
    log: SubsystemLog,
    settings: Option<Settings>,
    switches: Switches,
    hotkeys: HotkeyRegistry,
    runtime: Option<Box<dyn ScriptRuntime>>,
    scripts: Option<ScriptExecutor>,
    scanner: Box<dyn ModuleScanner>,
    // Declared last: plugins are torn down after everything that may hold their actions.
    plugins: PluginContainer,
}

impl Manager {
    pub fn builder(config: ManagerConfig) -> ManagerBuilder {
        ManagerBuilder {
            config,
            runtime: None,
            scanner: None,
            log: None,
        }
    }

    /// Build with default collaborators and run startup.
    ///
    /// Also installs a `tracing` subscriber unless the host already has one.
    pub fn launch(config: ManagerConfig) -> Self {
        crate::logging::init_tracing("spectrum=info");
        let mut manager = Self::builder(config).build();
        manager.start();
        manager
    }

    /// Run the startup sequence up to `Running`.
    ///
    /// Only the first call has an effect. Nothing here is fatal: a subsystem
    /// that cannot load is logged and left disabled.
    pub fn start(&mut self) {
        if self.state != ManagerState::Uninitialized {
            tracing::debug!("start() ignored in state {:?}", self.state);
            return;
        }

        self.load_settings();
        self.load_script_hotkeys();
        self.advance(ManagerState::SettingsLoaded);

        if self.switches.load_scripts && self.load_scripts() {
            self.advance(ManagerState::ScriptsLoaded);
            self.start_scripts();
            self.advance(ManagerState::ScriptsStarted);
        }

        if self.switches.load_plugins && self.load_plugins() {
            self.advance(ManagerState::PluginsLoaded);
            self.start_plugins();
            self.advance(ManagerState::PluginsStarted);
        }

        self.advance(ManagerState::Running);
        self.log.info(&format!(
            "Spectrum running: {} scripts, {} plugins, {} hotkeys",
            self.scripts
                .as_ref()
                .map_or(0, |executor| executor.loader().scripts().len()),
            self.plugins.len(),
            self.hotkeys.script_count() + self.hotkeys.action_count()
        ));
    }

    /// Dispatch one host tick.
    ///
    /// Fails with [`ManagerError::NotRunning`] outside the `Running` state,
    /// without touching any extension. Extension failures never surface here;
    /// they are listed in the returned report.
    pub fn update(&mut self, input: &dyn InputSource) -> ManagerResult<TickReport> {
        if self.state != ManagerState::Running {
            return Err(ManagerError::NotRunning(self.state));
        }

        let mut report = TickReport::default();

        for (hotkey, script) in self.hotkeys.scripts() {
            if !hotkey.is_pressed(input) {
                continue;
            }

            let outcome = match self.scripts.as_mut() {
                Some(executor) => executor.execute_loaded(script).map_err(|e| e.to_string()),
                None => Err(ManagerError::ScriptsDisabled.to_string()),
            };

            match outcome {
                Ok(()) => report.scripts_executed += 1,
                Err(message) => record_failure(
                    &self.log,
                    &mut report,
                    FailureSource::Script {
                        hotkey: *hotkey,
                        script: script.to_string(),
                    },
                    message,
                ),
            }
        }

        for (hotkey, bound) in self.hotkeys.actions_mut() {
            if !hotkey.is_pressed(input) {
                continue;
            }

            match isolate(|| bound.invoke()) {
                Ok(()) => report.actions_invoked += 1,
                Err(e) => record_failure(
                    &self.log,
                    &mut report,
                    FailureSource::Action {
                        hotkey: *hotkey,
                        owner: bound.owner().to_string(),
                    },
                    format!("{e:#}"),
                ),
            }
        }

        for descriptor in self.plugins.iter_mut() {
            if !descriptor.is_enabled() || !descriptor.is_updatable() {
                continue;
            }

            match isolate(|| descriptor.update()) {
                Ok(()) => report.plugins_updated += 1,
                Err(e) => record_failure(
                    &self.log,
                    &mut report,
                    FailureSource::Plugin(descriptor.id().to_string()),
                    format!("{e:#}"),
                ),
            }
        }

        Ok(report)
    }

    /// Bind `action` to `hotkey` on behalf of `owner`.
    ///
    /// Refused, and logged with the current holder named, if any script or
    /// action already has the hotkey.
    pub fn add_hotkey(
        &mut self,
        hotkey: Hotkey,
        owner: &str,
        action: HotkeyAction,
    ) -> Result<(), HotkeyError> {
        bind_action_logged(&mut self.hotkeys, &self.log, hotkey, owner, action)
    }

    /// Run a startup or on-demand script by identifier.
    pub fn execute_script(&mut self, id: &str) -> ManagerResult<()> {
        let executor = self.scripts.as_mut().ok_or(ManagerError::ScriptsDisabled)?;
        if let Err(e) = executor.execute(id) {
            self.log.error(&e.to_string());
            return Err(e.into());
        }
        Ok(())
    }

    /// Enable or disable a loaded plugin. Returns `false` for an unknown identity.
    pub fn set_plugin_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.plugins.get_mut(id) {
            Some(descriptor) => {
                descriptor.set_enabled(enabled);
                self.log.info(&format!(
                    "Plugin '{}' {}",
                    id,
                    if enabled { "enabled" } else { "disabled" }
                ));
                true
            }
            None => false,
        }
    }

    /// Shut every plugin down once and stop dispatching.
    pub fn shutdown(&mut self) {
        if self.state == ManagerState::Stopped {
            return;
        }

        for descriptor in self.plugins.iter_mut() {
            let plugin = descriptor.plugin_mut();
            if let Err(e) = isolate(|| plugin.shutdown()) {
                let id = descriptor.id().to_string();
                self.log
                    .exception(&e.context(format!("Plugin '{id}' failed to shut down")));
            }
        }

        self.advance(ManagerState::Stopped);
        self.log.info("Spectrum stopped");
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[ManagerState] {
        &self.history
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn switches(&self) -> Switches {
        self.switches
    }

    /// The script directory exists.
    pub fn can_load_scripts(&self) -> bool {
        self.config.script_dir.is_dir()
    }

    /// The plugin directory exists.
    pub fn can_load_plugins(&self) -> bool {
        self.config.plugin_dir.is_dir()
    }

    pub fn plugins(&self) -> &PluginContainer {
        &self.plugins
    }

    pub fn hotkeys(&self) -> &HotkeyRegistry {
        &self.hotkeys
    }

    /// The script executor, once scripts have been loaded.
    pub fn scripts(&self) -> Option<&ScriptExecutor> {
        self.scripts.as_ref()
    }

    /// Manager settings, or `None` if they could not be loaded.
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn log(&self) -> &SubsystemLog {
        &self.log
    }

    fn advance(&mut self, next: ManagerState) {
        tracing::debug!("Manager state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn load_settings(&mut self) {
        let opened = Settings::open(&self.config.settings_dir, SETTINGS_OWNER, None);
        let mut settings = match opened {
            Ok(settings) => settings,
            Err(e) => {
                self.log
                    .error(&format!("Couldn't load settings, defaults loaded: {e}"));
                self.switches = Switches::default();
                return;
            }
        };

        if settings.is_first_run() {
            settings.set(FIRST_RUN_KEY, "false");
            settings.set(LOAD_PLUGINS_KEY, "true");
            settings.set(LOAD_SCRIPTS_KEY, "true");
            if let Err(e) = settings.save() {
                self.log.error(&format!("Couldn't save default settings: {e}"));
            }
        }

        self.switches = Switches {
            load_scripts: read_switch(&self.log, &settings, LOAD_SCRIPTS_KEY),
            load_plugins: read_switch(&self.log, &settings, LOAD_PLUGINS_KEY),
        };
        self.settings = Some(settings);
    }

    fn load_script_hotkeys(&mut self) {
        let settings = match Settings::open(
            &self.config.settings_dir,
            SETTINGS_OWNER,
            Some(HOTKEYS_SECTION),
        ) {
            Ok(settings) => settings,
            Err(e) => {
                self.log.error(&format!("Couldn't load script hotkeys: {e}"));
                return;
            }
        };

        for (key, script) in settings.iter() {
            let hotkey = match Hotkey::parse(key) {
                Ok(hotkey) => hotkey,
                Err(e) => {
                    self.log.error(&format!("{e}. Skipping it."));
                    continue;
                }
            };

            if let Err(HotkeyError::Conflict { owner, .. }) =
                self.hotkeys.bind_script(hotkey, script)
            {
                self.log.error(&format!(
                    "The hotkey '{hotkey}' has already been assigned to {owner}. {NOT_REASSIGNED}"
                ));
            }
        }
    }

    fn load_scripts(&mut self) -> bool {
        if !self.can_load_scripts() {
            self.log.error(&format!(
                "Can't load or execute scripts. Directory '{}' does not exist.",
                self.config.script_dir.display()
            ));
            return false;
        }

        let mut loader = ScriptLoader::new(
            &self.config.script_dir,
            &self.config.on_demand_script_dir,
            &self.config.script_extension,
        );

        match loader.load_all() {
            Ok(failures) => {
                for failure in failures {
                    self.log.error(&failure.to_string());
                }
            }
            Err(e) => {
                self.log.error(&format!("Can't load scripts: {e}"));
                return false;
            }
        }

        let runtime = self
            .runtime
            .take()
            .unwrap_or_else(|| Box::new(InterpreterRuntime::lua()));
        let mut executor = ScriptExecutor::new(loader, runtime);

        // update() runs hotkey-bound scripts from memory only.
        for (hotkey, script) in self.hotkeys.scripts() {
            if let Err(e) = executor.preload(script) {
                self.log
                    .error(&format!("Script for hotkey '{hotkey}' is unavailable: {e}"));
            }
        }

        self.scripts = Some(executor);
        true
    }

    fn start_scripts(&mut self) {
        if let Some(executor) = self.scripts.as_mut() {
            for failure in executor.execute_all() {
                self.log.error(&failure.to_string());
            }
        }
    }

    fn load_plugins(&mut self) -> bool {
        let loader = PluginLoader::new(&self.config.plugin_dir, self.config.api_level);
        if !loader.can_load() {
            self.log.error(&format!(
                "Can't load plugins. Directory '{}' does not exist.",
                self.config.plugin_dir.display()
            ));
            return false;
        }

        let report = loader.load_plugins(self.scanner.as_mut(), &mut self.plugins);
        for failure in &report.failures {
            self.log.error(&format!("Plugin module skipped: {failure}"));
        }
        for id in &report.loaded {
            self.log.info(&format!("Loaded plugin '{id}'"));
        }
        true
    }

    fn start_plugins(&mut self) {
        let api_level = self.config.api_level;
        let log = &self.log;
        let hotkeys = &mut self.hotkeys;

        for descriptor in self.plugins.iter_mut() {
            let id = descriptor.id().to_string();
            let mut host = HostHandle {
                owner: &id,
                api_level,
                hotkeys: &mut *hotkeys,
                log,
            };

            let plugin = descriptor.plugin_mut();
            if let Err(e) = isolate(|| plugin.initialize(&mut host)) {
                let message = format!("Plugin '{id}' failed to initialize, disabling it");
                log.exception(&e.context(message));
                descriptor.set_enabled(false);
            }
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        if self.state != ManagerState::Stopped {
            self.shutdown();
        }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("state", &self.state)
            .field("switches", &self.switches)
            .field("hotkeys", &self.hotkeys)
            .field("scripts", &self.scripts)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

/// The manager handle a plugin sees during `initialize`.
struct HostHandle<'a> {
    owner: &'a str,
    api_level: u32,
    hotkeys: &'a mut HotkeyRegistry,
    log: &'a SubsystemLog,
}

impl PluginHost for HostHandle<'_> {
    fn add_hotkey(&mut self, hotkey: Hotkey, action: HotkeyAction) -> Result<(), HotkeyError> {
        bind_action_logged(self.hotkeys, self.log, hotkey, self.owner, action)
    }

    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn log(&self) -> &SubsystemLog {
        self.log
    }
}

fn bind_action_logged(
    hotkeys: &mut HotkeyRegistry,
    log: &SubsystemLog,
    hotkey: Hotkey,
    owner: &str,
    action: HotkeyAction,
) -> Result<(), HotkeyError> {
    hotkeys.bind_action(hotkey, owner, action).map_err(|e| {
        if let HotkeyError::Conflict { owner: holder, .. } = &e {
            log.error(&format!(
                "The hotkey '{hotkey}' requested by '{owner}' is already assigned to {holder}. \
                 {NOT_REASSIGNED}"
            ));
        }
        e
    })
}

fn read_switch(log: &SubsystemLog, settings: &Settings, key: &str) -> bool {
    match settings.get_as::<bool>(key) {
        Ok(value) => value,
        Err(e) => {
            log.error(&format!("{e}. Assuming '{key}' is enabled."));
            true
        }
    }
}

fn record_failure(
    log: &SubsystemLog,
    report: &mut TickReport,
    source: FailureSource,
    message: String,
) {
    let failure = DispatchFailure { source, message };
    log.error(&failure.to_string());
    report.failures.push(failure);
}
