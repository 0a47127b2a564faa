use ansi_term::{Color, Style};

use zograscope_core::Type;

/// Print styles for the aligned diff output.
#[derive(Default, Clone)]
pub struct DiffStyles {
  pub line_num: Style,
  pub header: Style,
  // diff insert style
  pub insert: Style,
  // diff deletion style
  pub delete: Style,
  // whole-token update style
  pub update: Style,
  pub moved: Style,
}

impl DiffStyles {
  pub fn colored() -> Self {
    static RED: Color = Color::Fixed(161);
    static GREEN: Color = Color::Fixed(35);
    static YELLOW: Color = Color::Fixed(178);
    static BLUE: Color = Color::Fixed(33);
    Self {
      line_num: Style::new().dimmed(),
      header: Style::new().bold(),
      insert: Style::new().fg(GREEN),
      delete: Style::new().fg(RED),
      update: Style::new().fg(YELLOW),
      moved: Style::new().fg(BLUE),
    }
  }

  pub fn no_color() -> Self {
    Self::default()
  }

  pub fn new(use_color: bool) -> Self {
    if use_color {
      Self::colored()
    } else {
      Self::no_color()
    }
  }
}

/// Maps token categories onto highlight styles for `zs hi`.
pub fn highlight_style(use_color: bool, ty: Type) -> Style {
  if !use_color {
    return Style::new();
  }
  match ty {
    Type::Comments => Style::new().dimmed().italic(),
    Type::Directives => Color::Purple.normal(),
    Type::StrConstants | Type::CharConstants => Color::Green.normal(),
    Type::IntConstants | Type::FPConstants => Color::Cyan.normal(),
    Type::Keywords | Type::Jumps => Color::Blue.bold(),
    Type::Specifiers | Type::Types | Type::UserTypes => Color::Yellow.normal(),
    Type::Functions => Style::new().bold(),
    _ => Style::new(),
  }
}
