use super::error::{ScriptError, ScriptResult};
use super::loader::ScriptLoader;
use super::runtime::ScriptRuntime;
use crate::dispatch::isolate;

/// Runs loaded and on-demand scripts through a [`ScriptRuntime`].
pub struct ScriptExecutor {
    loader: ScriptLoader,
    runtime: Box<dyn ScriptRuntime>,
}

impl ScriptExecutor {
    pub fn new(loader: ScriptLoader, runtime: Box<dyn ScriptRuntime>) -> Self {
        Self { loader, runtime }
    }

    pub fn loader(&self) -> &ScriptLoader {
        &self.loader
    }

    /// Read an on-demand script into memory so later runs need no disk access.
    ///
    /// Startup scripts and scripts read earlier are left as they are.
    pub fn preload(&mut self, id: &str) -> ScriptResult<()> {
        if self.loader.cached(id).is_none() {
            self.loader.load_on_demand(id)?;
        }
        Ok(())
    }

    /// Execute one script by identifier.
    ///
    /// Startup scripts are taken from memory; anything else is read from the
    /// on-demand directory on first use and kept. Runtime errors and panics
    /// are both returned as [`ScriptError::Execution`].
    pub fn execute(&mut self, id: &str) -> ScriptResult<()> {
        self.preload(id)?;
        self.execute_loaded(id)
    }

    /// Execute a script that is already in memory.
    ///
    /// Never reads from disk: an identifier that was not loaded or preloaded
    /// is [`ScriptError::NotFound`].
    pub fn execute_loaded(&mut self, id: &str) -> ScriptResult<()> {
        let handle = self
            .loader
            .cached(id)
            .ok_or_else(|| ScriptError::NotFound(id.to_string()))?;
        let runtime = &mut self.runtime;

        isolate(|| runtime.run(handle)).map_err(|source| ScriptError::Execution {
            id: id.to_string(),
            source,
        })
    }

    /// Execute every startup script once, in load order.
    ///
    /// A failing script does not stop the ones after it; failures are returned.
    pub fn execute_all(&mut self) -> Vec<ScriptError> {
        let mut failures = Vec::new();

        for handle in self.loader.scripts() {
            let runtime = &mut self.runtime;
            if let Err(source) = isolate(|| runtime.run(handle)) {
                failures.push(ScriptError::Execution {
                    id: handle.id().to_string(),
                    source,
                });
            }
        }

        failures
    }
}

impl std::fmt::Debug for ScriptExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptExecutor")
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::ScriptHandle;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::tempdir;

    type Journal = Rc<RefCell<Vec<String>>>;

    fn recording_runtime(journal: &Journal) -> Box<dyn ScriptRuntime> {
        let journal = journal.clone();
        Box::new(move |script: &ScriptHandle| {
            journal.borrow_mut().push(script.id().to_string());
            if script.source().contains("error(") {
                anyhow::bail!("runtime error in {}", script.id());
            }
            if script.source().contains("panic(") {
                panic!("interpreter crashed");
            }
            Ok(())
        })
    }

    fn executor(journal: &Journal) -> (tempfile::TempDir, ScriptExecutor) {
        let temp = tempdir().unwrap();
        let scripts = temp.path().join("Scripts");
        let on_demand = temp.path().join("OnDemand");
        fs::create_dir_all(&scripts).unwrap();
        fs::create_dir_all(&on_demand).unwrap();

        fs::write(scripts.join("1-first.lua"), "ok()").unwrap();
        fs::write(scripts.join("2-broken.lua"), "error('x')").unwrap();
        fs::write(scripts.join("3-crash.lua"), "panic()").unwrap();
        fs::write(scripts.join("4-last.lua"), "ok()").unwrap();
        fs::write(on_demand.join("toggle.lua"), "ok()").unwrap();

        let mut loader = ScriptLoader::new(scripts, on_demand, "lua");
        loader.load_all().unwrap();
        (temp, ScriptExecutor::new(loader, recording_runtime(journal)))
    }

    #[test]
    fn test_execute_all_isolates_failures() {
        let journal = Journal::default();
        let (_temp, mut executor) = executor(&journal);

        let failures = executor.execute_all();

        assert_eq!(
            *journal.borrow(),
            vec!["1-first.lua", "2-broken.lua", "3-crash.lua", "4-last.lua"]
        );
        assert_eq!(failures.len(), 2);
        assert!(failures[1].to_string().contains("interpreter crashed"));
    }

    #[test]
    fn test_on_demand_only_runs_when_requested() {
        let journal = Journal::default();
        let (_temp, mut executor) = executor(&journal);

        executor.execute_all();
        assert!(!journal.borrow().contains(&"toggle.lua".to_string()));

        executor.execute("toggle.lua").unwrap();
        assert_eq!(journal.borrow().last().unwrap(), "toggle.lua");
    }

    #[test]
    fn test_execute_unknown_script() {
        let journal = Journal::default();
        let (_temp, mut executor) = executor(&journal);

        assert!(matches!(
            executor.execute("nope.lua"),
            Err(ScriptError::NotFound(_))
        ));
        assert!(journal.borrow().is_empty());
    }

    #[test]
    fn test_execute_loaded_never_reads_the_directory() {
        let journal = Journal::default();
        let (temp, mut executor) = executor(&journal);

        assert!(matches!(
            executor.execute_loaded("toggle.lua"),
            Err(ScriptError::NotFound(_))
        ));
        assert!(journal.borrow().is_empty());

        executor.preload("toggle.lua").unwrap();
        fs::remove_file(temp.path().join("OnDemand").join("toggle.lua")).unwrap();

        executor.execute_loaded("toggle.lua").unwrap();
        executor.execute("toggle.lua").unwrap();
        assert_eq!(*journal.borrow(), vec!["toggle.lua", "toggle.lua"]);
    }
}
