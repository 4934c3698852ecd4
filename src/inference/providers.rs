mod openrouter;

pub use openrouter::{
    DEFAULT_BASE_URL, DEFAULT_REFERER, DEFAULT_TITLE, OpenRouterProvider, REQUEST_TIMEOUT,
    extract_content, system_instruction, today,
};
