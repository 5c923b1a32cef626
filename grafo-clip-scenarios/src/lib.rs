pub mod case;
pub mod region;
pub mod scenarios;
pub mod shapes;

pub use case::{ClipCase, ClipCaseBuilder, ClipSpec, ElementsBuilder, SavePolicy};
pub use region::PixelRegion;
pub use scenarios::{build_scenarios, device_bounds};
pub use shapes::{make_octagon, make_octagon_with};
