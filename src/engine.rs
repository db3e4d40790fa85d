mod random_engine;

use crate::rules::MoveDescriptor;
pub use random_engine::RandomEngine;

pub fn init_engine() -> Box<dyn Engine> {
    let engine = RandomEngine::new();
    Box::new(engine)
}

pub trait Engine: Send + Sync {
    /// Pick the reply to play among `legal_moves`. `None` when there is nothing to play.
    fn search(&mut self, legal_moves: Vec<MoveDescriptor>) -> Option<MoveDescriptor>;
}
