//! Language front-ends for zograscope.
//!
//! Every supported language maps tree-sitter node kinds onto structural tags
//! and token categories and implements the policy predicates of the core's
//! [`Language`] trait. Adding a language means writing the two tables, the
//! predicate set and registering the extension here.

#[cfg(feature = "lang-bash")]
mod bash;
#[cfg(feature = "lang-c")]
mod c;
#[cfg(feature = "lang-cpp")]
mod cpp;
#[cfg(feature = "lang-lua")]
mod lua;
mod transformer;

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use zograscope_core::{Error, Language};

/// Implements a language-private structural tag enumeration together with the
/// conversions from and to the core's opaque `SType`.
macro_rules! stypes {
  ($name:ident { $($variant:ident,)* }) => {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[repr(u8)]
    pub(crate) enum $name {
      None,
      $($variant,)*
    }

    impl $name {
      const ALL: &'static [$name] = &[$name::None, $($name::$variant,)*];

      pub(crate) fn of(stype: zograscope_core::SType) -> $name {
        Self::ALL[stype.0 as usize]
      }

      pub(crate) fn name(stype: zograscope_core::SType) -> &'static str {
        match Self::of(stype) {
          $name::None => "None",
          $($name::$variant => stringify!($variant),)*
        }
      }
    }

    impl From<$name> for zograscope_core::SType {
      fn from(stype: $name) -> Self {
        zograscope_core::SType(stype as u8)
      }
    }

    impl PartialEq<$name> for zograscope_core::SType {
      fn eq(&self, other: &$name) -> bool {
        *self == zograscope_core::SType::from(*other)
      }
    }
  };
}
pub(crate) use stypes;

/// A supported language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lang {
  #[cfg(feature = "lang-c")]
  C,
  #[cfg(feature = "lang-cpp")]
  Cpp,
  #[cfg(feature = "lang-lua")]
  Lua,
  #[cfg(feature = "lang-bash")]
  Bash,
}

impl Lang {
  /// Creates the language policy object.
  pub fn create(self) -> Box<dyn Language> {
    match self {
      #[cfg(feature = "lang-c")]
      Lang::C => Box::new(c::CLang),
      #[cfg(feature = "lang-cpp")]
      Lang::Cpp => Box::new(cpp::CppLang),
      #[cfg(feature = "lang-lua")]
      Lang::Lua => Box::new(lua::LuaLang),
      #[cfg(feature = "lang-bash")]
      Lang::Bash => Box::new(bash::BashLang),
    }
  }

  /// Detects the language from a file name; `None` for unknown extensions.
  pub fn detect(path: &Path) -> Option<Lang> {
    let ext = path
      .extension()
      .map(|e| e.to_string_lossy().to_lowercase())
      .unwrap_or_default();

    match ext.as_str() {
      #[cfg(feature = "lang-c")]
      "c" | "h" => Some(Lang::C),
      #[cfg(feature = "lang-cpp")]
      "cpp" | "cxx" | "cc" | "hpp" | "hxx" | "hh" => Some(Lang::Cpp),
      #[cfg(feature = "lang-lua")]
      "lua" => Some(Lang::Lua),
      #[cfg(feature = "lang-bash")]
      "sh" | "bash" => Some(Lang::Bash),
      _ => None,
    }
  }

  /// Resolves the language of a file. An explicit `--lang` always wins,
  /// which is also how the ambiguous `.h` extension ends up as C++ when the
  /// user asks for it; without an override unknown extensions fall back to
  /// C.
  pub fn for_file(path: &Path, requested: Option<&str>) -> Result<Lang, Error> {
    let Some(requested) = requested else {
      #[cfg(feature = "lang-c")]
      return Ok(Self::detect(path).unwrap_or(Lang::C));
      #[cfg(not(feature = "lang-c"))]
      return Self::detect(path)
        .ok_or_else(|| Error::UnknownLanguage(path.display().to_string()));
    };

    Lang::from_str(requested)
  }

  pub fn all() -> &'static [Lang] {
    &[
      #[cfg(feature = "lang-c")]
      Lang::C,
      #[cfg(feature = "lang-cpp")]
      Lang::Cpp,
      #[cfg(feature = "lang-lua")]
      Lang::Lua,
      #[cfg(feature = "lang-bash")]
      Lang::Bash,
    ]
  }
}

impl FromStr for Lang {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      #[cfg(feature = "lang-c")]
      "c" => Ok(Lang::C),
      #[cfg(feature = "lang-cpp")]
      "cxx" | "cpp" | "c++" => Ok(Lang::Cpp),
      #[cfg(feature = "lang-lua")]
      "lua" => Ok(Lang::Lua),
      #[cfg(feature = "lang-bash")]
      "bash" | "sh" => Ok(Lang::Bash),
      other => Err(Error::UnknownLanguage(other.to_owned())),
    }
  }
}

impl Display for Lang {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let name = match self {
      #[cfg(feature = "lang-c")]
      Lang::C => "c",
      #[cfg(feature = "lang-cpp")]
      Lang::Cpp => "cxx",
      #[cfg(feature = "lang-lua")]
      Lang::Lua => "lua",
      #[cfg(feature = "lang-bash")]
      Lang::Bash => "bash",
    };
    write!(f, "{name}")
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn extensions_resolve_case_insensitively() {
    assert_eq!(Lang::detect(Path::new("x/file.C")), Some(Lang::C));
    assert_eq!(Lang::detect(Path::new("file.HPP")), Some(Lang::Cpp));
    assert_eq!(Lang::detect(Path::new("init.lua")), Some(Lang::Lua));
    assert_eq!(Lang::detect(Path::new("run.sh")), Some(Lang::Bash));
    assert_eq!(Lang::detect(Path::new("README.md")), None);
  }

  #[test]
  fn header_follows_requested_cpp() {
    let header = Path::new("api.h");
    assert_eq!(Lang::for_file(header, None).unwrap(), Lang::C);
    assert_eq!(Lang::for_file(header, Some("cxx")).unwrap(), Lang::Cpp);
  }

  #[test]
  fn unknown_extension_defaults_to_c() {
    assert_eq!(Lang::for_file(Path::new("weird.zzz"), None).unwrap(), Lang::C);
  }

  #[test]
  fn unknown_override_is_an_error() {
    let err = Lang::for_file(Path::new("a.c"), Some("cobol")).unwrap_err();
    assert!(matches!(err, Error::UnknownLanguage(_)));
  }
}
