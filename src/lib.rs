pub mod common;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mapping;
pub mod planning;

use crate::lifecycle::LifecycleNode;
use crate::mapping::MappingStack;
use crate::planning::PlanningStack;

/// Core functionality for the Helios vehicle
pub struct HeliosCore {
    components: Vec<Box<dyn LifecycleNode>>,
}

impl HeliosCore {
    /// Create a new instance of HeliosCore
    pub fn new() -> Self {
        HeliosCore {
            components: Vec::new(),
        }
    }

    /// Register a component with the core
    pub fn register<T: LifecycleNode + 'static>(&mut self, component: T) {
        self.components.push(Box::new(component));
    }

    /// Initialize all registered components
    pub fn init(&mut self) -> Result<(), String> {
        for component in &mut self.components {
            component.on_configure()?;
            component.on_activate()?;
        }
        Ok(())
    }

    /// Shutdown all registered components
    pub fn shutdown(&mut self) -> Result<(), String> {
        for component in &mut self.components {
            component.on_deactivate()?;
            component.on_cleanup()?;
        }
        Ok(())
    }

    /// Get a reference to the registered Grid Builder stack
    pub fn mapping_stack_mut(&mut self) -> Option<&mut MappingStack> {
        self.components
            .iter_mut()
            .find_map(|component| component.as_any_mut().downcast_mut::<MappingStack>())
    }

    /// Get a reference to the registered Planning Orchestrator stack
    pub fn planning_stack_mut(&mut self) -> Option<&mut PlanningStack> {
        self.components
            .iter_mut()
            .find_map(|component| component.as_any_mut().downcast_mut::<PlanningStack>())
    }
}

impl Default for HeliosCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeliosConfig;

    #[test]
    fn registers_and_cycles_both_stacks() {
        let config = HeliosConfig::default();
        let mut core = HeliosCore::new();
        core.register(MappingStack::new(&config));
        core.register(PlanningStack::new(&config));
        core.init().unwrap();
        assert!(core.mapping_stack_mut().is_some());
        assert!(core.planning_stack_mut().is_some());
        core.shutdown().unwrap();
    }
}
