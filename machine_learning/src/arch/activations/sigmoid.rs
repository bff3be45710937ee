#[derive(Clone, Copy, Debug, Default)]
pub struct Sigmoid {
    amp: f32,
}

impl Sigmoid {
    pub fn new(amp: f32) -> Self {
        Self { amp }
    }

    pub fn f(&self, z: f32) -> f32 {
        self.amp / (1. + (-z).exp())
    }

    /// The derivative expressed in terms of the activation `a = f(z)`.
    pub fn df(&self, a: f32) -> f32 {
        (a * (self.amp - a)) / self.amp
    }
}
