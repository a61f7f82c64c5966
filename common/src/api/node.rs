use serde::Deserialize;

/// JSON-RPC method returning the node's current head tipset.
pub const CHAIN_HEAD_METHOD: &str = "Filecoin.ChainHead";

/// Content identifier as the node serializes it: `{"/": "bafy..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CidRef {
    #[serde(rename = "/")]
    pub cid: String,
}

/// Subset of the node's `ChainHead` result consumed by the auditor.
///
/// The node returns the full head tipset; only the height and the block cids
/// are decoded, everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadTipset {
    #[serde(rename = "Height")]
    pub height: u64,
    #[serde(rename = "Cids", default)]
    pub cids: Vec<CidRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_head_tipset() {
        let payload = r#"{
            "Cids": [{"/": "bafy2bzaceaa"}, {"/": "bafy2bzaceab"}],
            "Blocks": [{}, {}],
            "Height": 482910
        }"#;
        let head: HeadTipset = serde_json::from_str(payload).unwrap();
        assert_eq!(head.height, 482910);
        assert_eq!(head.cids.len(), 2);
        assert_eq!(head.cids[0].cid, "bafy2bzaceaa");
    }

    #[test]
    fn test_decode_head_tipset_without_cids() {
        let head: HeadTipset = serde_json::from_str(r#"{"Height": 0}"#).unwrap();
        assert_eq!(head.height, 0);
        assert!(head.cids.is_empty());
    }
}
