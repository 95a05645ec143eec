//! Item binding configuration
//!
//! A binding string is a run of bracketed parts, for example
//! `<[aircon:80:30000]>[ON:aircon:80:30]>[OFF:aircon:80:31]`:
//!
//! | part | meaning |
//! |---|---|
//! | `<[dev:epc:refresh]` | poll `epc` every `refresh` ms (empty refresh: default interval) |
//! | `<[dev:epc:edt:refresh]` | poll with an explicit request EDT |
//! | `<[dev:epc]` | read `epc` whenever the item's state is updated locally |
//! | `>[command:dev:epc:edt]` | write `edt` when `command` is received (`*` matches any) |
//! | `>[dev:epc]` | write a value-derived EDT for unmapped commands and state updates |

use crate::payload::{ItemValue, Payload};
use crate::session::Request;
use echonet_core::{EchonetError, EchonetResult};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

/// Command key matching every command without its own mapping
pub const WILDCARD_COMMAND: &str = "*";

/// Command prefix carrying an explicit EDT, e.g. `value=0130`
pub const VALUE_PREFIX: &str = "value=";

static WHOLE_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[<>]\[[^\]]*\])+$").expect("valid binding pattern")
});

static BINDING_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>]\[[^\]]*\]").expect("valid binding part pattern"));

static POLL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\[([0-9_a-zA-Z]+):([0-9_a-zA-Z]+)(?::([0-9_a-zA-Z]+))?:([0-9]*)\]$")
        .expect("valid poll pattern")
});

static INPUT_FOR_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\[([0-9_a-zA-Z]+):([0-9_a-zA-Z]+)\]$").expect("valid input pattern")
});

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^>\[([0-9_a-zA-Z]+|\*):([0-9_a-zA-Z]+):([0-9_a-zA-Z]+):([0-9_a-zA-Z]+)\]$")
        .expect("valid command pattern")
});

static OUTPUT_FOR_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^>\[([0-9_a-zA-Z]+):([0-9_a-zA-Z]+)\]$").expect("valid output pattern")
});

/// A device property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTarget {
    pub device: String,
    /// EPC as hex
    pub property_code: String,
}

impl PropertyTarget {
    pub fn new(device: impl Into<String>, property_code: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            property_code: property_code.into(),
        }
    }

    fn read(&self, item: &str) -> Request {
        Request::read(item, &self.device, &self.property_code)
    }

    fn write(&self, item: &str, payload: Payload) -> Request {
        Request::write(item, &self.device, &self.property_code, payload)
    }
}

/// Periodic read of a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollBinding {
    pub target: PropertyTarget,
    /// Request EDT as hex; reads send none
    pub edt: Option<String>,
    /// `None` uses the client's default interval
    pub refresh: Option<Duration>,
}

impl PollBinding {
    /// Effective interval; zero disables polling
    pub fn refresh_interval(&self, default: Duration) -> Duration {
        self.refresh.unwrap_or(default)
    }

    pub fn request(&self, item: &str) -> Request {
        match &self.edt {
            Some(edt) => self.target.write(item, Payload::Hex(edt.clone())),
            None => self.target.read(item),
        }
    }
}

/// Fixed EDT written for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBinding {
    pub target: PropertyTarget,
    pub edt: String,
}

/// Everything bound to one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemBinding {
    poll: Option<PollBinding>,
    input_for_update: Option<PropertyTarget>,
    output_for_update: Option<PropertyTarget>,
    commands: HashMap<String, CommandBinding>,
}

impl ItemBinding {
    /// Parse a binding string
    ///
    /// Later parts of the same kind replace earlier ones.
    ///
    /// # Errors
    /// Returns `EchonetError::Binding` if the string is not made of bracketed
    /// parts, or a part matches no known shape
    pub fn parse(config: &str) -> EchonetResult<Self> {
        let config = config.trim();
        if !WHOLE_BINDING.is_match(config) {
            return Err(EchonetError::Binding(format!(
                "'{}' doesn't contain a valid binding configuration",
                config
            )));
        }

        let mut binding = Self::default();
        for part in BINDING_PART.find_iter(config) {
            binding.parse_part(part.as_str())?;
        }
        Ok(binding)
    }

    fn parse_part(&mut self, part: &str) -> EchonetResult<()> {
        if let Some(c) = POLL.captures(part) {
            let refresh = match &c[4] {
                "" => None,
                ms => Some(Duration::from_millis(ms.parse::<u64>().map_err(|e| {
                    EchonetError::Binding(format!("{}: invalid refresh interval: {}", part, e))
                })?)),
            };
            self.poll = Some(PollBinding {
                target: PropertyTarget::new(&c[1], &c[2]),
                edt: c.get(3).map(|m| m.as_str().to_string()),
                refresh,
            });
        } else if let Some(c) = INPUT_FOR_UPDATE.captures(part) {
            self.input_for_update = Some(PropertyTarget::new(&c[1], &c[2]));
        } else if let Some(c) = COMMAND.captures(part) {
            self.commands.insert(
                c[1].to_string(),
                CommandBinding {
                    target: PropertyTarget::new(&c[2], &c[3]),
                    edt: c[4].to_string(),
                },
            );
        } else if let Some(c) = OUTPUT_FOR_UPDATE.captures(part) {
            self.output_for_update = Some(PropertyTarget::new(&c[1], &c[2]));
        } else {
            return Err(EchonetError::Binding(format!(
                "'{}' must be <[dev:epc]>, <[dev:epc:refresh]>, <[dev:epc:edt:refresh]>, \
                 >[dev:epc] or >[command:dev:epc:edt]",
                part
            )));
        }
        Ok(())
    }

    pub fn poll(&self) -> Option<&PollBinding> {
        self.poll.as_ref()
    }

    pub fn input_for_update(&self) -> Option<&PropertyTarget> {
        self.input_for_update.as_ref()
    }

    pub fn output_for_update(&self) -> Option<&PropertyTarget> {
        self.output_for_update.as_ref()
    }

    /// Mapping for `command`, falling back to the wildcard mapping
    pub fn command(&self, command: &str) -> Option<&CommandBinding> {
        self.commands
            .get(command)
            .or_else(|| self.commands.get(WILDCARD_COMMAND))
    }

    /// Request to send when `command` is received for `item`
    ///
    /// A mapped command writes its fixed EDT. Otherwise the output binding
    /// is used with the hex after `value=`, or with an EDT derived from the
    /// command value itself.
    pub fn command_request(&self, item: &str, command: &ItemValue) -> Option<Request> {
        let text = command.to_string();
        if let Some(mapping) = self.command(&text) {
            return Some(mapping.target.write(item, Payload::Hex(mapping.edt.clone())));
        }

        let target = self.output_for_update.as_ref()?;
        let payload = match text.split_once(VALUE_PREFIX) {
            Some((_, edt)) if !edt.trim().is_empty() => Payload::Hex(edt.trim().to_string()),
            _ => Payload::Value(command.clone()),
        };
        Some(target.write(item, payload))
    }

    /// Request to send when the item's state is updated locally
    ///
    /// The output binding writes the new state; failing that, the input
    /// binding reads the property back.
    pub fn update_request(&self, item: &str, state: &ItemValue) -> Option<Request> {
        if let Some(target) = &self.output_for_update {
            return Some(target.write(item, Payload::Value(state.clone())));
        }
        self.input_for_update
            .as_ref()
            .map(|target| target.read(item))
    }
}

/// Item name to binding mapping
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    items: HashMap<String, ItemBinding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a binding, replacing any previous one for `item`
    pub fn register(&mut self, item: impl Into<String>, config: &str) -> EchonetResult<()> {
        let item = item.into();
        let binding = ItemBinding::parse(config).map_err(|e| {
            log::warn!("Invalid binding for item '{}': {}", item, e);
            e
        })?;
        log::debug!("Registered binding for item '{}': {:?}", item, binding);
        self.items.insert(item, binding);
        Ok(())
    }

    pub fn insert(&mut self, item: impl Into<String>, binding: ItemBinding) {
        self.items.insert(item.into(), binding);
    }

    pub fn remove(&mut self, item: &str) -> Option<ItemBinding> {
        self.items.remove(item)
    }

    pub fn get(&self, item: &str) -> Option<&ItemBinding> {
        self.items.get(item)
    }

    /// Items with a poll binding, in name order
    pub fn polled_items(&self) -> Vec<(&str, &PollBinding)> {
        let mut items: Vec<_> = self
            .items
            .iter()
            .filter_map(|(item, binding)| binding.poll().map(|poll| (item.as_str(), poll)))
            .collect();
        items.sort_by_key(|(item, _)| *item);
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
