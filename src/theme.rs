// Light palette with a single teal accent for focus, toggles and the primary action.

pub const SURFACE: u32 = 0xf1f1ef;
pub const TITLEBAR_BACKGROUND: u32 = 0xfbfbfa;
pub const INPUT_BACKGROUND: u32 = 0xf1f1ef;
pub const LOG_BACKGROUND: u32 = 0xfbfbfa;
pub const OVERLAY: u32 = 0x1a1a1a80;

pub const BORDER: u32 = 0xcbcac6;
pub const BORDER_FOCUS: u32 = 0x1f8a85;

pub const TEXT_PRIMARY: u32 = 0x111111;
pub const TEXT_DIM: u32 = 0x5d5b57;
pub const TEXT_WHITE: u32 = 0xffffff;
pub const INPUT_PLACEHOLDER: u32 = 0xa29f9a66;

pub const LOG_TEXT: u32 = 0x45433f;
pub const LOG_ERROR: u32 = 0xc8323f;
pub const LOG_CLIENT: u32 = 0x2c6e9b;
pub const LOG_PLACEHOLDER: u32 = 0xb5b2ad;

pub const BUTTON_PRIMARY: u32 = 0x1f8a85;
pub const BUTTON_HOVER: u32 = 0x17706c;
pub const BUTTON_DANGER: u32 = 0xc8323f;
pub const BUTTON_DANGER_HOVER: u32 = 0xa72833;

pub const COLOR_GREEN: u32 = 0x2f9e58;
pub const COLOR_RED: u32 = 0xc8323f;
pub const COLOR_YELLOW: u32 = 0xc07a12;
pub const COLOR_GRAY: u32 = 0x8c8a86;

pub const SELECTION: u32 = 0x1f8a8540;

pub const TEXT_SIZE_MEDIUM: f32 = 13.0;
pub const TEXT_SIZE_SMALL: f32 = 12.0;
pub const TEXT_SIZE_EXTRA_SMALL: f32 = 10.0;

pub const LINE_HEIGHT_MEDIUM: f32 = 18.0;
pub const LINE_HEIGHT_EXTRA_SMALL: f32 = 14.0;

pub const ELEMENT_HEIGHT: f32 = 32.0;
pub const TITLEBAR_HEIGHT: f32 = 32.0;

pub const RADIUS: f32 = 4.0;
pub const CURSOR_WIDTH: f32 = 2.0;

pub const GAP_EXTRA_SMALL: f32 = 4.0;
pub const GAP_SMALL: f32 = 8.0;
pub const GAP_MEDIUM: f32 = 12.0;

pub const PADDING_INPUT_HORIZONTAL: f32 = 10.0;
pub const PADDING_INPUT_VERTICAL: f32 = 6.0;
pub const PADDING_COLUMN: f32 = 20.0;
pub const PADDING_COLUMN_TOP: f32 = 8.0;
pub const PADDING_LOG: f32 = 8.0;

pub const WINDOW_WIDTH: f32 = 960.0;
pub const WINDOW_HEIGHT: f32 = 680.0;
pub const LEFT_COLUMN_WIDTH: f32 = 400.0;
pub const PROFILE_BUTTON_WIDTH: f32 = 80.0;
pub const PROMPT_WIDTH: f32 = 360.0;

pub const TOGGLE_WIDTH: f32 = 34.0;
pub const TOGGLE_HEIGHT: f32 = 18.0;
pub const TOGGLE_DOT_SIZE: f32 = 14.0;
pub const TOGGLE_DOT_ON_OFFSET: f32 = 18.0;
pub const TOGGLE_DOT_OFF_OFFSET: f32 = 2.0;
pub const STATUS_DOT_SIZE: f32 = 8.0;
