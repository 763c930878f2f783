use serde_json::json;

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum PatchOpKind {
    ObjectAdd,
    ArrayAdd,
    ArrayRemove,
}

/// One operation of a document patch, `path` being a JSON pointer into the post doc
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOp {
    /// Operations adding `user` to (or removing it from) the `kind` reactions
    ///
    /// The first two operations make sure the containers exist, so that the
    /// last one cannot fail on a post that never got any reaction.
    pub fn reaction(kind: &str, user: &str, remove: bool) -> Vec<PatchOp> {
        vec![
            PatchOp {
                op: PatchOpKind::ObjectAdd,
                path: String::from("/reactions"),
                value: json!({}),
            },
            PatchOp {
                op: PatchOpKind::ObjectAdd,
                path: format!("/reactions/{kind}"),
                value: json!([]),
            },
            PatchOp {
                op: match remove {
                    true => PatchOpKind::ArrayRemove,
                    false => PatchOpKind::ArrayAdd,
                },
                path: format!("/reactions/{kind}"),
                value: json!(user),
            },
        ]
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    pub uri: String,
    pub patch_failed: bool,
    pub message: String,
}
