mod source_pipe;
mod spectrum;

pub use source_pipe::SourcePipe;
pub use spectrum::SpectrumAnalyzer;
