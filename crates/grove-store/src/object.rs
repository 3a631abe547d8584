use serde::{Deserialize, Serialize};

use grove_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content.
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// One graph revision: a root tree plus zero or more parent commits.
    Commit,
    /// A named reference to another object.
    Tag,
}

impl ObjectKind {
    /// Domain tag mixed into the content hash, so identical bytes stored
    /// under different kinds never collide on id.
    pub fn domain_tag(&self) -> &'static str {
        match self {
            Self::Blob => "grove-blob-v1",
            Self::Tree => "grove-tree-v1",
            Self::Commit => "grove-commit-v1",
            Self::Tag => "grove-tag-v1",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// `StoredObject` is the unit of storage and of transmission. The store never
/// interprets the data; typed accessors ([`Tree::from_stored_object`] and
/// friends) decode it on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed id: domain-separated BLAKE3 of the data.
    pub fn compute_id(&self) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.domain_tag().as_bytes());
        hasher.update(b":");
        hasher.update(&self.data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}

fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(StoredObject::new(kind, data))
}

fn decode<'a, T: Deserialize<'a>>(obj: &'a StoredObject, kind: ObjectKind) -> StoreResult<T> {
    if obj.kind != kind {
        return Err(StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("expected {kind}, got {}", obj.kind),
        });
    }
    serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Blob {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected blob, got {}", obj.kind),
            });
        }
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree (0o040000).
    Directory,
}

impl EntryMode {
    /// Octal mode value (for display/serialization).
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Returns `true` if this entry names a subtree.
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Entry name.
    pub name: String,
    /// Content-addressed id of the referenced object.
    pub id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            id,
        }
    }
}

/// Directory listing object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name for deterministic hashing.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree; entries are sorted by name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Tree, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Tree)
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// One revision of the graph: a root tree plus parent commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of this revision.
    pub tree_id: ObjectId,
    /// Parent commits; empty for a root commit, several for a merge.
    pub parents: Vec<ObjectId>,
    /// Author identification line.
    pub author: String,
    /// Commit message.
    pub message: String,
    /// Seconds since the epoch.
    pub timestamp: u64,
}

impl Commit {
    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Commit, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Commit)
    }

    /// Returns `true` for a commit without parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// A named reference to another object.
///
/// Tags dereference exactly one level: the target's kind is recorded so a
/// reader can peel the tag without fetching the target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// The referenced object.
    pub target: ObjectId,
    /// Kind of the referenced object.
    pub target_kind: ObjectKind,
    /// Tag name.
    pub name: String,
    /// Annotation message.
    pub message: String,
}

impl Tag {
    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Tag, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(obj, ObjectKind::Tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let blob = Blob::new(b"hello world".to_vec());
        let stored = blob.to_stored_object();
        let decoded = Blob::from_stored_object(&stored).unwrap();
        assert_eq!(blob, decoded);
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, b"not a blob".to_vec());
        let err = Blob::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "zebra.txt", ObjectId::null()),
            TreeEntry::new(EntryMode::Regular, "alpha.txt", ObjectId::null()),
            TreeEntry::new(EntryMode::Directory, "middle", ObjectId::null()),
        ]);
        assert_eq!(tree.entries[0].name, "alpha.txt");
        assert_eq!(tree.entries[1].name, "middle");
        assert_eq!(tree.entries[2].name, "zebra.txt");
    }

    #[test]
    fn tree_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "file.txt", ObjectId::hash(b"content")),
            TreeEntry::new(EntryMode::Directory, "subdir", ObjectId::hash(b"tree")),
        ]);
        let stored = tree.to_stored_object().unwrap();
        let decoded = Tree::from_stored_object(&stored).unwrap();
        assert_eq!(tree, decoded);
    }

    #[test]
    fn tree_get_and_len() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "a.txt", ObjectId::null()),
            TreeEntry::new(EntryMode::Regular, "b.txt", ObjectId::hash(b"b")),
        ]);
        assert!(tree.get("a.txt").is_some());
        assert!(tree.get("missing").is_none());
        assert_eq!(tree.len(), 2);
        assert!(Tree::empty().is_empty());
    }

    #[test]
    fn tree_decode_rejects_wrong_kind() {
        let blob = Blob::new(b"x".to_vec()).to_stored_object();
        assert!(matches!(
            Tree::from_stored_object(&blob),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn commit_roundtrip() {
        let commit = Commit {
            tree_id: ObjectId::hash(b"root tree"),
            parents: vec![ObjectId::hash(b"parent")],
            author: "a dev <dev@example.com>".into(),
            message: "change things".into(),
            timestamp: 1_700_000_000,
        };
        let stored = commit.to_stored_object().unwrap();
        let decoded = Commit::from_stored_object(&stored).unwrap();
        assert_eq!(commit, decoded);
        assert!(!decoded.is_root());
    }

    #[test]
    fn root_commit_has_no_parents() {
        let commit = Commit {
            tree_id: ObjectId::hash(b"t"),
            parents: vec![],
            author: "a".into(),
            message: "init".into(),
            timestamp: 0,
        };
        assert!(commit.is_root());
    }

    #[test]
    fn tag_roundtrip() {
        let tag = Tag {
            target: ObjectId::hash(b"a commit"),
            target_kind: ObjectKind::Commit,
            name: "v1.0".into(),
            message: "release".into(),
        };
        let stored = tag.to_stored_object().unwrap();
        let decoded = Tag::from_stored_object(&stored).unwrap();
        assert_eq!(tag, decoded);
    }

    #[test]
    fn stored_object_id_deterministic() {
        let obj = StoredObject::new(ObjectKind::Blob, b"deterministic".to_vec());
        assert_eq!(obj.compute_id(), obj.compute_id());
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data.clone());
        let commit = StoredObject::new(ObjectKind::Commit, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
        assert_ne!(blob.compute_id(), commit.compute_id());
        assert_ne!(tree.compute_id(), commit.compute_id());
    }

    #[test]
    fn object_kind_display() {
        assert_eq!(format!("{}", ObjectKind::Blob), "blob");
        assert_eq!(format!("{}", ObjectKind::Tree), "tree");
        assert_eq!(format!("{}", ObjectKind::Commit), "commit");
        assert_eq!(format!("{}", ObjectKind::Tag), "tag");
    }

    #[test]
    fn entry_mode_display_and_tree_flag() {
        assert_eq!(format!("{}", EntryMode::Regular), "100644");
        assert_eq!(format!("{}", EntryMode::Directory), "040000");
        assert!(EntryMode::Directory.is_tree());
        assert!(!EntryMode::Symlink.is_tree());
    }
}
