use crate::pipeline::Pipeline;
use crate::warehouse::Warehouse;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn warehouse(&self) -> &Warehouse {
        self.pipeline.warehouse()
    }
}
