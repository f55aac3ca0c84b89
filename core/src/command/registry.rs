use hashbrown::HashMap;

use super::{BUILTIN_COMMANDS, CommandDescriptor};

/// Name and alias lookup for directives.
///
/// Built once from a static table; hosts may register extra directives
/// before parsing.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    descriptors: Vec<CommandDescriptor>,
    /// Lowercased name or alias -> index into `descriptors`
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Registry without any directives.
    pub fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry with the built-in directives.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for descriptor in BUILTIN_COMMANDS {
            registry.register(*descriptor);
        }
        registry
    }

    /// Add a directive. A later registration shadows earlier names.
    pub fn register(&mut self, descriptor: CommandDescriptor) {
        let slot = self.descriptors.len();
        for name in std::iter::once(descriptor.name).chain(descriptor.aliases.iter().copied()) {
            if let Some(previous) = self.index.insert(name.to_lowercase(), slot) {
                log::debug!(
                    "Command '{}' shadows '{}'",
                    descriptor.name,
                    self.descriptors[previous].name
                );
            }
        }
        self.descriptors.push(descriptor);
    }

    /// Case-insensitive lookup by name or alias.
    pub fn resolve(&self, name: &str) -> Option<&CommandDescriptor> {
        self.index
            .get(&name.to_lowercase())
            .map(|&slot| &self.descriptors[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
