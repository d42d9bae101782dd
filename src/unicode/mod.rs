//! Display width of text in terminal cells.

mod width;

pub use width::{
    CharWidthExtent, WidthMethod, display_width_char_with_method, display_width_with_method,
};
