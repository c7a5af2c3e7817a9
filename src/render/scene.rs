use crate::render::{Drawable, RenderStates};
use std::cell::RefCell;
use std::rc::Rc;

/// A drawable shared between a layer and the code that moves it.
pub type SharedDrawable = Rc<RefCell<dyn Drawable>>;

/// Named, ordered list of drawables.
pub struct Layer {
    name: String,
    drawables: Vec<SharedDrawable>,
    /// Re-sort by `position().y` before every render.
    pub y_sort: bool,
    /// Hidden layers are skipped by render.
    pub visible: bool,
}

impl Layer {
    /// An empty, visible layer.
    pub fn new(name: impl Into<String>) -> Self {
        Layer {
            name: name.into(),
            drawables: Vec::new(),
            y_sort: false,
            visible: true,
        }
    }

    /// Name the scene finds this layer by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends `drawable`; it is drawn after everything already here.
    pub fn add(&mut self, drawable: SharedDrawable) {
        self.drawables.push(drawable);
    }

    /// Wraps `drawable`, adds it and hands back the typed handle.
    pub fn add_new<D: Drawable + 'static>(&mut self, drawable: D) -> Rc<RefCell<D>> {
        let shared = Rc::new(RefCell::new(drawable));
        self.drawables.push(shared.clone());
        shared
    }

    /// Removes `drawable` if present, compared by identity.
    pub fn remove(&mut self, drawable: &SharedDrawable) -> bool {
        let before = self.drawables.len();
        self.drawables.retain(|d| !Rc::ptr_eq(d, drawable));
        self.drawables.len() != before
    }

    /// Removes every drawable.
    pub fn clear(&mut self) {
        self.drawables.clear();
    }

    /// Drawables in draw order.
    pub fn drawables(&self) -> &[SharedDrawable] {
        &self.drawables
    }

    /// Number of drawables.
    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    /// Whether the layer holds nothing.
    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Stable sort by vertical position; drawables lower on screen end up
    /// drawn last.
    pub fn sort_by_y(&mut self) {
        self.drawables.sort_by(|a, b| y_of(a).total_cmp(&y_of(b)));
    }

    /// Draws every drawable in order, sorting first when `y_sort` is set.
    pub fn render(&mut self, states: &RenderStates) {
        if !self.visible {
            return;
        }
        if self.y_sort {
            self.sort_by_y();
        }
        for drawable in &self.drawables {
            match drawable.try_borrow() {
                Ok(d) => d.draw(states),
                Err(_) => log::trace!("layer '{}': drawable busy, skipped", self.name),
            }
        }
    }
}

fn y_of(d: &SharedDrawable) -> f32 {
    d.try_borrow().map(|d| d.position().y).unwrap_or(0.0)
}

/// Layers drawn back to front: the default layer first, then named layers by
/// ascending order, equal orders in the order they were added.
pub struct Scene {
    default_layer: Layer,
    layers: Vec<(i32, Layer)>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Name of the layer every scene starts with.
    pub const DEFAULT_LAYER: &'static str = "default";

    /// A scene with only the default layer.
    pub fn new() -> Self {
        Scene {
            default_layer: Layer::new(Self::DEFAULT_LAYER),
            layers: Vec::new(),
        }
    }

    /// Adds an empty layer. An existing layer with the same name, including
    /// the default layer, is returned untouched.
    pub fn add_layer(&mut self, name: &str, order: i32) -> &mut Layer {
        if name == Self::DEFAULT_LAYER {
            return &mut self.default_layer;
        }
        let index = match self.layers.iter().position(|(_, l)| l.name == name) {
            Some(existing) => existing,
            None => {
                let at = self.layers.partition_point(|(o, _)| *o <= order);
                self.layers.insert(at, (order, Layer::new(name)));
                at
            }
        };
        &mut self.layers[index].1
    }

    /// Removes a named layer. The default layer cannot be removed.
    pub fn remove_layer(&mut self, name: &str) -> Option<Layer> {
        let index = self.layers.iter().position(|(_, l)| l.name == name)?;
        Some(self.layers.remove(index).1)
    }

    /// The layer called `name`.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        if name == Self::DEFAULT_LAYER {
            return Some(&self.default_layer);
        }
        self.layers.iter().map(|(_, l)| l).find(|l| l.name == name)
    }

    /// Mutable form of [`Scene::layer`].
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        if name == Self::DEFAULT_LAYER {
            return Some(&mut self.default_layer);
        }
        self.layers.iter_mut().map(|(_, l)| l).find(|l| l.name == name)
    }

    /// The layer drawn first.
    pub fn default_layer(&self) -> &Layer {
        &self.default_layer
    }

    /// Mutable form of [`Scene::default_layer`].
    pub fn default_layer_mut(&mut self) -> &mut Layer {
        &mut self.default_layer
    }

    /// Layer names in draw order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default_layer.name()).chain(self.layers.iter().map(|(_, l)| l.name()))
    }

    /// Renders every layer back to front.
    pub fn render(&mut self, states: &RenderStates) {
        self.default_layer.render(states);
        for (_, layer) in &mut self.layers {
            layer.render(states);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::prelude::*;
    use std::cell::Cell;

    /// Records the order it was drawn in.
    struct Marker {
        y: f32,
        id: u32,
        log: Rc<RefCell<Vec<u32>>>,
        draws: Cell<u32>,
    }

    impl Drawable for Marker {
        fn position(&self) -> Vec2 {
            vec2(0.0, self.y)
        }
        fn global_bounds(&self) -> Rect {
            Rect::new(0.0, self.y, 1.0, 1.0)
        }
        fn draw(&self, _: &RenderStates) {
            self.draws.set(self.draws.get() + 1);
            self.log.borrow_mut().push(self.id);
        }
    }

    fn marker(log: &Rc<RefCell<Vec<u32>>>, id: u32, y: f32) -> Marker {
        Marker {
            y,
            id,
            log: log.clone(),
            draws: Cell::new(0),
        }
    }

    #[test]
    fn scene_draws_default_layer_then_by_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = Scene::new();
        scene.add_layer("front", 10).add_new(marker(&log, 3, 0.0));
        scene.add_layer("back", -5).add_new(marker(&log, 1, 0.0));
        scene.add_layer("middle", 10).add_new(marker(&log, 4, 0.0));
        scene.default_layer_mut().add_new(marker(&log, 0, 0.0));

        assert_eq!(
            scene.layer_names().collect::<Vec<_>>(),
            ["default", "back", "front", "middle"]
        );
        scene.render(&RenderStates::default());
        assert_eq!(*log.borrow(), [0, 1, 3, 4]);
    }

    #[test]
    fn y_sort_is_stable() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut layer = Layer::new("actors");
        layer.y_sort = true;
        layer.add_new(marker(&log, 1, 50.0));
        layer.add_new(marker(&log, 2, 10.0));
        layer.add_new(marker(&log, 3, 50.0));
        layer.add_new(marker(&log, 4, -3.0));
        layer.render(&RenderStates::default());
        assert_eq!(*log.borrow(), [4, 2, 1, 3]);
    }

    #[test]
    fn hidden_layers_and_removal() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = Scene::new();
        let layer = scene.add_layer("fx", 0);
        let kept = layer.add_new(marker(&log, 1, 0.0));
        let gone: SharedDrawable = layer.add_new(marker(&log, 2, 0.0));
        assert!(layer.remove(&gone));
        assert!(!layer.remove(&gone));

        scene.render(&RenderStates::default());
        assert_eq!(kept.borrow().draws.get(), 1);

        scene.layer_mut("fx").unwrap().visible = false;
        scene.render(&RenderStates::default());
        assert_eq!(kept.borrow().draws.get(), 1);
        assert!(scene.remove_layer("fx").is_some());
        assert!(scene.layer("fx").is_none());
        assert!(scene.layer("default").is_some());
    }

    #[test]
    fn default_name_reaches_the_default_layer() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = Scene::new();
        scene.add_layer(Scene::DEFAULT_LAYER, 7).add_new(marker(&log, 1, 0.0));

        assert_eq!(scene.default_layer().len(), 1);
        assert_eq!(scene.layer("default").unwrap().len(), 1);
        assert_eq!(scene.layer_names().collect::<Vec<_>>(), ["default"]);
        scene.render(&RenderStates::default());
        assert_eq!(*log.borrow(), [1]);
    }
}
