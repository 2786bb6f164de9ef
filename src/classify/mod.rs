mod backend;
pub mod backends;
mod preprocess;
mod tensor;

pub use backend::{Classifier, InputSpec};
pub use backends::StubClassifier;
#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
pub use preprocess::Preprocessor;
pub use tensor::{InputTensor, Scaling, TensorLayout};
