mod announced;
mod broadcast;
mod group;
mod produce;
mod track;

pub use announced::*;
pub use broadcast::*;
pub use group::*;
pub use produce::*;
pub use track::*;
