use proptest::prelude::*;
use snapdb::tree::{codec, path};
use snapdb::{Node, NodeType};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9._-]{1,8}"
}

fn key() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("/"))
}

fn node() -> impl Strategy<Value = Node> {
    (key(), any::<bool>(), "[0-9a-f]{0,16}", any::<i64>(), any::<i64>()).prop_map(
        |(path, leaf, etag, mtime, size)| {
            let mut node = if leaf {
                Node::leaf(path, etag, size, mtime)
            } else {
                Node::collection(path, etag, mtime)
            };
            node.set_meta("transient", 1);
            node
        },
    )
}

proptest! {
    #[test]
    fn codec_preserves_persisted_fields(original in node()) {
        let decoded = codec::decode(&codec::encode(&original).unwrap()).unwrap();
        prop_assert_eq!(&decoded.path, &original.path);
        prop_assert_eq!(decoded.node_type, original.node_type);
        prop_assert_eq!(&decoded.etag, &original.etag);
        prop_assert_eq!(decoded.mtime, original.mtime);
        prop_assert_eq!(decoded.size, original.size);
        prop_assert!(decoded.metadata.is_empty());
    }

    #[test]
    fn rebase_moves_key_under_new_base(from in key(), to in key(), rest in prop::option::of(key())) {
        let source = match &rest {
            Some(rest) => format!("{}/{}", from, rest),
            None => from.clone(),
        };
        let moved = path::rebase(&source, &from, &to);
        prop_assert!(path::is_within(&moved, &to));
        match &rest {
            Some(rest) => prop_assert_eq!(moved, format!("{}/{}", to, rest)),
            None => prop_assert_eq!(moved, to.clone()),
        }
    }

    #[test]
    fn normalizing_drops_empty_segments(parts in prop::collection::vec("[a-z]{0,3}", 1..6)) {
        let raw = format!("/{}/", parts.join("//"));
        let key = path::normalize(&raw);
        prop_assert_eq!(path::normalize(&key), key.clone());
        prop_assert!(!key.starts_with('/') && !key.ends_with('/') && !key.contains("//"));
        for ancestor in path::ancestors(&raw) {
            prop_assert!(!ancestor.is_empty() && !ancestor.ends_with('/'));
        }
    }

    #[test]
    fn ancestors_are_all_within_and_shallower(k in key()) {
        let ancestors = path::ancestors(&k);
        prop_assert_eq!(ancestors.len(), k.matches('/').count());
        for ancestor in &ancestors {
            prop_assert!(path::is_within(&k, ancestor));
            prop_assert!(ancestor.len() < k.len());
        }
    }
}

#[test]
fn collection_kind_survives_codec() {
    let node = Node::placeholder("a/b");
    let decoded = codec::decode(&codec::encode(&node).unwrap()).unwrap();
    assert_eq!(decoded.node_type, NodeType::Collection);
    assert!(decoded.is_placeholder());
}
