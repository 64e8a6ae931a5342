// Concrete collaborators for the core engine: image decoding, file
// mutation and the terminal operator.

pub mod decode;
pub mod files;
pub mod prompt;

pub use decode::{GrayImageSource, ImageCrateSource};
pub use files::{FsDeleter, ZipArchiver};
pub use prompt::{ScriptedOperator, TerminalOperator};
