//! The smallest useful plugin: announces itself and says goodbye.
//!
//! Build it and drop the resulting library into the Spectrum plugin directory.

use spectrum::plugins::{Plugin, PluginHost, NO_CONTACT};

#[derive(Debug, Default)]
pub struct TestPlugin;

impl Plugin for TestPlugin {
    fn friendly_name(&self) -> &str {
        "TestPlugin"
    }

    fn author(&self) -> &str {
        "Ciastex"
    }

    fn contact(&self) -> &str {
        NO_CONTACT
    }

    fn compatible_api_level(&self) -> u32 {
        1
    }

    fn initialize(&mut self, host: &mut dyn PluginHost) -> anyhow::Result<()> {
        tracing::debug!("TestPlugin initializing against API level {}", host.api_level());
        host.log().info("TestPlugin");
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        tracing::info!("TestPlugin Shutting Down!");
        Ok(())
    }
}

spectrum::declare_plugin!(TestPlugin);
