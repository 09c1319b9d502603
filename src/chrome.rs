//! Window chrome policy
//!
//! Maps the wizard step to the window affordances it allows.

use crate::state::WizardState;
use serde::Deserialize;

/// Window-level affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeCapabilities {
    pub closable: bool,
    pub maximizable: bool,
    pub system_menu: bool,
}

/// What "platform default" means for the system menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMenuRule {
    /// Keep the baseline on Linux, hide it elsewhere
    #[default]
    Platform,
    /// Always keep the window's baseline flag
    Keep,
    /// Always hide the system menu
    Hide,
}

impl SystemMenuRule {
    pub fn keeps_baseline(self) -> bool {
        match self {
            SystemMenuRule::Platform => cfg!(target_os = "linux"),
            SystemMenuRule::Keep => true,
            SystemMenuRule::Hide => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromePolicy {
    baseline_system_menu: bool,
    keep_system_menu: bool,
}

impl ChromePolicy {
    pub fn new(baseline_system_menu: bool, rule: SystemMenuRule) -> Self {
        Self {
            baseline_system_menu,
            keep_system_menu: rule.keeps_baseline(),
        }
    }

    pub fn capabilities(&self, state: WizardState) -> ChromeCapabilities {
        let platform_menu = self.keep_system_menu && self.baseline_system_menu;

        match state {
            WizardState::Installing => ChromeCapabilities {
                closable: false,
                maximizable: false,
                system_menu: false,
            },
            WizardState::SourceSelect | WizardState::DeviceSelect | WizardState::Result => {
                ChromeCapabilities {
                    closable: true,
                    maximizable: false,
                    system_menu: platform_menu,
                }
            }
        }
    }
}

impl Default for ChromePolicy {
    fn default() -> Self {
        Self::new(true, SystemMenuRule::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_holds_for_every_state_and_rule() {
        for rule in [SystemMenuRule::Platform, SystemMenuRule::Keep, SystemMenuRule::Hide] {
            for baseline in [true, false] {
                let policy = ChromePolicy::new(baseline, rule);
                let menu = baseline && rule.keeps_baseline();

                for state in WizardState::ALL {
                    let caps = policy.capabilities(state);
                    let expected = match state {
                        WizardState::Installing => ChromeCapabilities {
                            closable: false,
                            maximizable: false,
                            system_menu: false,
                        },
                        _ => ChromeCapabilities {
                            closable: true,
                            maximizable: false,
                            system_menu: menu,
                        },
                    };
                    assert_eq!(caps, expected, "{state:?} with {rule:?}/{baseline}");
                }
            }
        }
    }

    #[test]
    fn test_keep_and_hide_rules() {
        let keep = ChromePolicy::new(true, SystemMenuRule::Keep);
        assert!(keep.capabilities(WizardState::Result).system_menu);

        let hide = ChromePolicy::new(true, SystemMenuRule::Hide);
        assert!(!hide.capabilities(WizardState::SourceSelect).system_menu);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_platform_rule_keeps_baseline_on_linux() {
        let policy = ChromePolicy::default();
        assert!(policy.capabilities(WizardState::DeviceSelect).system_menu);
    }
}
