use alloc::string::String;
use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Runtime token naming a Rust type.
///
/// Equality and hashing only look at the [`TypeId`]; the name is carried
/// along for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeDesc {
    id: TypeId,
    name: &'static str,
}

static_assertions::assert_impl_all!(TypeDesc: Send, Sync, Copy);

impl TypeDesc {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name, as reported by [`core::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The name with every module path stripped, generics included:
    /// `alloc::vec::Vec<core::option::Option<i32>>` becomes `Vec<Option<i32>>`.
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment_start = 0;
        for (i, c) in self.name.char_indices() {
            if c.is_alphanumeric() || c == '_' || c == ':' {
                continue;
            }
            out.push_str(last_segment(&self.name[segment_start..i]));
            out.push(c);
            segment_start = i + c.len_utf8();
        }
        out.push_str(last_segment(&self.name[segment_start..]));
        out
    }
}

fn last_segment(path: &str) -> &str {
    match path.rfind("::") {
        Some(pos) => &path[pos + 2..],
        None => path,
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl Hash for TypeDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDesc({})", self.name)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}
