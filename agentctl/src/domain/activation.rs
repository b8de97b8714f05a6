//! Agent activation options and the manual-load option string.
//!
//! Pure functions only. No I/O or async here.

use std::path::Path;

/// Parameters for one activation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentActivationOptions {
    /// System properties passed to the agent, in caller order.
    pub properties: Vec<String>,
    /// Listener bind address; `None` or empty means the agent default.
    pub host: Option<String>,
    /// Listener port; `0` means the agent default.
    pub port: u16,
    /// Put the agent module on the bootstrap search path.
    pub add_to_boot_classpath: bool,
    /// Run the agent under its security policy.
    pub enforce_security_policy: bool,
}

impl AgentActivationOptions {
    /// Host, if one was supplied and it is non-empty.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref().filter(|h| !h.is_empty())
    }
}

/// Compose the option string handed to the agent module when it is loaded
/// manually into a process.
///
/// Fragment order: `listener:true`, `address:`, `port:`, `policy:true`, one
/// `prop:` per property (caller order, no dedup), then `boot:`.
#[must_use]
pub fn compose_agent_options(options: &AgentActivationOptions, module_path: &Path) -> String {
    let mut composed = String::from("listener:true");
    if let Some(host) = options.host() {
        composed.push_str(",address:");
        composed.push_str(host);
    }
    if options.port != 0 {
        composed.push_str(&format!(",port:{}", options.port));
    }
    if options.enforce_security_policy {
        composed.push_str(",policy:true");
    }
    for prop in &options.properties {
        composed.push_str(",prop:");
        composed.push_str(prop);
    }
    if options.add_to_boot_classpath {
        composed.push_str(",boot:");
        composed.push_str(&module_path.to_string_lossy());
    }
    composed
}
