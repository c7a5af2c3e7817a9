use crate::ecs::component::EntityId;
use crate::ecs::group::ComponentGroup;
use macroquad::input::{get_keys_pressed, get_keys_released, KeyCode};
use std::collections::HashSet;
use std::fmt;

/// A key changing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// The key went down.
    Pressed(KeyCode),
    /// The key went up.
    Released(KeyCode),
}

/// Key presses and releases macroquad saw this frame.
pub fn poll_key_events() -> Vec<KeyEvent> {
    let mut events: Vec<KeyEvent> = get_keys_pressed().into_iter().map(KeyEvent::Pressed).collect();
    events.extend(get_keys_released().into_iter().map(KeyEvent::Released));
    events
}

/// Action run every update while its key is held; it gets the owning group.
pub type InputCallback = Box<dyn FnMut(&mut ComponentGroup)>;

/// Maps keys to actions on the owning entity.
pub struct InputsComponent {
    pub(crate) owner: Option<EntityId>,
    bindings: Vec<(KeyCode, InputCallback)>,
    held: HashSet<KeyCode>,
    capture: bool,
}

impl fmt::Debug for InputsComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputsComponent")
            .field("bound", &self.bindings.iter().map(|(k, _)| *k).collect::<Vec<_>>())
            .field("held", &self.held)
            .field("capture", &self.capture)
            .finish()
    }
}

impl Default for InputsComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl InputsComponent {
    /// No bindings, capturing input.
    pub fn new() -> Self {
        InputsComponent {
            owner: None,
            bindings: Vec::new(),
            held: HashSet::new(),
            capture: true,
        }
    }

    /// Binds `key`, replacing an earlier binding of the same key.
    pub fn bind(&mut self, key: KeyCode, callback: impl FnMut(&mut ComponentGroup) + 'static) {
        let callback: InputCallback = Box::new(callback);
        match self.bindings.iter_mut().find(|(k, _)| *k == key) {
            Some(binding) => binding.1 = callback,
            None => self.bindings.push((key, callback)),
        }
    }

    /// Removes the binding of `key`; false if there was none.
    pub fn unbind(&mut self, key: KeyCode) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|(k, _)| *k != key);
        self.bindings.len() != before
    }

    /// Whether `key` has an action.
    pub fn is_bound(&self, key: KeyCode) -> bool {
        self.bindings.iter().any(|(k, _)| *k == key)
    }

    /// While not capturing, held keys are still tracked but no action runs.
    pub fn set_capture_input(&mut self, capture: bool) {
        self.capture = capture;
    }

    /// Whether bound actions run on update.
    pub fn is_capturing(&self) -> bool {
        self.capture
    }

    /// Whether `key` is down as far as this component knows.
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Records a press or release.
    pub fn handle_event(&mut self, event: &KeyEvent) {
        match *event {
            KeyEvent::Pressed(key) => {
                self.held.insert(key);
            }
            KeyEvent::Released(key) => {
                self.held.remove(&key);
            }
        }
    }

    pub(crate) fn update(&mut self, group: &mut ComponentGroup, _dt: f32) {
        if !self.capture {
            return;
        }
        for (key, callback) in &mut self.bindings {
            if self.held.contains(key) {
                callback(group);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::transform::TransformComponent;
    use macroquad::prelude::*;

    fn walker() -> ComponentGroup {
        let mut inputs = InputsComponent::new();
        inputs.bind(KeyCode::Right, |g| {
            if let Some(t) = g.transform_mut() {
                t.move_by(vec2(1.0, 0.0));
            }
        });
        inputs.bind(KeyCode::Up, |g| {
            if let Some(t) = g.transform_mut() {
                t.move_by(vec2(0.0, -1.0));
            }
        });
        let mut g = ComponentGroup::new("walker");
        g.add(TransformComponent::default()).add(inputs);
        g
    }

    #[test]
    fn held_keys_run_their_actions_each_update() {
        let mut g = walker();
        g.handle_key_event(&KeyEvent::Pressed(KeyCode::Right));
        g.update(0.016);
        g.update(0.016);
        assert_eq!(g.transform().unwrap().position, vec2(2.0, 0.0));

        g.handle_key_event(&KeyEvent::Released(KeyCode::Right));
        g.handle_key_event(&KeyEvent::Pressed(KeyCode::Up));
        g.update(0.016);
        assert_eq!(g.transform().unwrap().position, vec2(2.0, -1.0));
        assert!(g.inputs().unwrap().is_held(KeyCode::Up));
    }

    #[test]
    fn capture_off_suspends_actions() {
        let mut g = walker();
        g.inputs_mut().unwrap().set_capture_input(false);
        g.handle_key_event(&KeyEvent::Pressed(KeyCode::Right));
        g.update(0.016);
        assert_eq!(g.transform().unwrap().position, Vec2::ZERO);
        assert!(g.inputs().unwrap().is_held(KeyCode::Right));
    }

    #[test]
    fn rebinding_replaces_and_unbind_removes() {
        let mut inputs = InputsComponent::new();
        inputs.bind(KeyCode::Space, |_| {});
        inputs.bind(KeyCode::Space, |_| {});
        assert!(inputs.is_bound(KeyCode::Space));
        assert!(inputs.unbind(KeyCode::Space));
        assert!(!inputs.unbind(KeyCode::Space));
    }

    #[test]
    fn children_receive_key_events() {
        let mut root = ComponentGroup::new("root");
        root.add_child("pet").add(InputsComponent::new());
        root.handle_key_event(&KeyEvent::Pressed(KeyCode::A));
        assert!(root.child("pet").unwrap().inputs().unwrap().is_held(KeyCode::A));
    }

    #[test]
    fn action_may_remove_its_own_component() {
        let mut inputs = InputsComponent::new();
        inputs.bind(KeyCode::Escape, |g| {
            g.remove::<InputsComponent>();
        });
        let mut g = ComponentGroup::new("menu");
        g.add(inputs);
        g.handle_key_event(&KeyEvent::Pressed(KeyCode::Escape));
        g.update(0.016);
        assert!(!g.has::<InputsComponent>());
    }
}
