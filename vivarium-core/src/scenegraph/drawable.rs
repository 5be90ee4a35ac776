use glam::{DMat4, DVec3};

/// Handle to whichever rendering context was current when a shape was
/// built. Copied into every shape; the scene graph never looks inside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderContext(pub u32);

pub type Color = glam::Vec3;

pub type DrawHandle = u32;

/// Geometry a renderer knows how to compile. Cubes and cylinders grow along
/// +z from the node origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Cube { edge: f64, scale: DVec3 },
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
    HalfRoundCylinder { radius: f64, height: f64 },
    RoundCylinder { radius: f64, height: f64 },
    Tank { half_extents: DVec3 },
}

/*
 * The rendering side of the scene graph. `allocate` compiles a primitive into
 * whatever the backend uses (display list, vertex buffer) and `draw` submits
 * it with a model matrix.
 */
pub trait RenderBackend {
    fn allocate(&mut self, context: RenderContext, primitive: &Primitive) -> DrawHandle;
    fn draw(&mut self, handle: DrawHandle, model: &DMat4, color: Color, highlighted: bool);
}

pub trait Drawable {
    fn initialize(&mut self, backend: &mut dyn RenderBackend);
    fn draw(&self, model: &DMat4, highlighted: bool, backend: &mut dyn RenderBackend);
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub primitive: Primitive,
    pub color: Color,
    context: RenderContext,
    handle: Option<DrawHandle>,
}

impl Shape {
    pub fn new(context: RenderContext, primitive: Primitive, color: Color) -> Shape {
        Shape {
            primitive,
            color,
            context,
            handle: None,
        }
    }

    pub fn context(&self) -> RenderContext {
        self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drawable for Shape {
    fn initialize(&mut self, backend: &mut dyn RenderBackend) {
        if self.handle.is_none() {
            self.handle = Some(backend.allocate(self.context, &self.primitive));
        }
    }

    // shapes that were never initialized have nothing to submit
    fn draw(&self, model: &DMat4, highlighted: bool, backend: &mut dyn RenderBackend) {
        if let Some(handle) = self.handle {
            backend.draw(handle, model, self.color, highlighted);
        }
    }
}
