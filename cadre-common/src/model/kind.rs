use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The classpath kinds a bucket's contents extend into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ClasspathScope: u8 {
        const COMPILE = 0b00000001;
        const RUNTIME = 0b00000010;
    }
}

impl Default for ClasspathScope {
    fn default() -> Self {
        Self::COMPILE | Self::RUNTIME
    }
}

impl fmt::Display for ClasspathScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClasspathKind {
    Compile,
    Runtime,
}

impl ClasspathKind {
    pub fn scope(self) -> ClasspathScope {
        match self {
            Self::Compile => ClasspathScope::COMPILE,
            Self::Runtime => ClasspathScope::RUNTIME,
        }
    }
}

impl fmt::Display for ClasspathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// The four declarable bucket roles a suite owns.
///
/// `annotation_processor` carries an empty scope: its bucket never extends
/// into either classpath and is resolved as its own single-purpose request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketRole {
    Implementation,
    CompileOnly,
    RuntimeOnly,
    AnnotationProcessor,
}

impl BucketRole {
    pub const ALL: [BucketRole; 4] = [
        BucketRole::Implementation,
        BucketRole::CompileOnly,
        BucketRole::RuntimeOnly,
        BucketRole::AnnotationProcessor,
    ];

    pub fn scope(self) -> ClasspathScope {
        match self {
            Self::Implementation => ClasspathScope::COMPILE | ClasspathScope::RUNTIME,
            Self::CompileOnly => ClasspathScope::COMPILE,
            Self::RuntimeOnly => ClasspathScope::RUNTIME,
            Self::AnnotationProcessor => ClasspathScope::empty(),
        }
    }

    pub fn extends_into(self, kind: ClasspathKind) -> bool {
        self.scope().contains(kind.scope())
    }
}

impl fmt::Display for BucketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implementation => write!(f, "implementation"),
            Self::CompileOnly => write!(f, "compileOnly"),
            Self::RuntimeOnly => write!(f, "runtimeOnly"),
            Self::AnnotationProcessor => write!(f, "annotationProcessor"),
        }
    }
}
