//! Terminal presentation of the read-aloud controls

pub mod view;

pub use view::{
    render_banner, render_change, render_status, render_toggle, render_voice_list, LOADING_VOICES,
    UNSUPPORTED_NOTICE,
};
