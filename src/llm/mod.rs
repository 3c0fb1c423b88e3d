// Hosted generative model integration

pub mod gemini;

pub use gemini::GeminiClient;
