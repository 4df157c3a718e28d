use serde_yaml::{Mapping, Value};

/// Deep merge `overlay` into `base`.
///
/// Two mappings merge key by key, recursively; any other pairing is a plain
/// replacement by the overlay. Keys missing from the overlay are kept.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => merge_maps(base_map, overlay_map, merge),
        (base, overlay) => *base = overlay,
    }
}

/// Like [`merge`], but two sequences at the same place are concatenated.
/// Used for security blocks, where permission lists accumulate.
pub fn merge_concat(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            merge_maps(base_map, overlay_map, merge_concat)
        }
        (Value::Sequence(base_items), Value::Sequence(overlay_items)) => base_items.extend(overlay_items),
        (base, overlay) => *base = overlay,
    }
}

fn merge_maps(base: &mut Mapping, overlay: Mapping, recurse: fn(&mut Value, Value)) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => recurse(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

/// Fold layers from least to most specific
pub fn merge_all<I>(base: Value, layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers.into_iter().fold(base, |mut acc, layer| {
        merge(&mut acc, layer);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_nested_maps_merge_key_by_key() {
        let mut base = yaml("{label: Status, validators: {required: {}}, type: string}");
        merge(&mut base, yaml("{validators: {maxLength: {max: 32}}, type: select}"));

        assert_eq!(base["label"], Value::from("Status"));
        assert_eq!(base["type"], Value::from("select"));
        assert!(base["validators"].get("required").is_some());
        assert_eq!(base["validators"]["maxLength"]["max"], Value::from(32));
    }

    #[test]
    fn test_non_map_values_are_replaced() {
        let mut base = yaml("{choices: [a, b], meta: {x: 1}}");
        merge(&mut base, yaml("{choices: [c], meta: plain}"));
        assert_eq!(base["choices"], yaml("[c]"));
        assert_eq!(base["meta"], Value::from("plain"));

        // a map overlay replaces a scalar
        let mut base = yaml("{meta: plain}");
        merge(&mut base, yaml("{meta: {x: 1}}"));
        assert_eq!(base["meta"]["x"], Value::from(1));
    }

    #[test]
    fn test_key_order_is_kept() {
        let mut base = yaml("{label: a, type: b}");
        merge(&mut base, yaml("{extra: c, label: z}"));
        let keys: Vec<_> = base
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["label", "type", "extra"]);
    }

    #[test]
    fn test_merge_all_equals_stepwise_merge() {
        let base = yaml("{label: A, type: number, validators: {required: {}}}");
        let special = yaml("{type: table_list, tableListIdentifier: x}");
        let merge_frag = yaml("{validators: {min: {value: 1}}, label: B}");
        let custom = yaml("{label: C, validators: {required: null}}");

        let mut stepwise = base.clone();
        merge(&mut stepwise, special.clone());
        merge(&mut stepwise, merge_frag.clone());
        merge(&mut stepwise, custom.clone());

        let folded = merge_all(base, [special, merge_frag, custom]);
        assert_eq!(folded, stepwise);
        assert_eq!(folded["label"], Value::from("C"));
        assert_eq!(folded["type"], Value::from("table_list"));
        assert_eq!(folded["validators"]["required"], Value::Null);
        assert_eq!(folded["validators"]["min"]["value"], Value::from(1));
    }

    #[test]
    fn test_merge_concat_appends_sequences() {
        let mut base = yaml("{any: {micro_permission: store.orders.read}, all: [a]}");
        merge_concat(&mut base, yaml("{all: [b], any: {role: admin}}"));
        assert_eq!(base["all"], yaml("[a, b]"));
        assert_eq!(base["any"]["micro_permission"], Value::from("store.orders.read"));
        assert_eq!(base["any"]["role"], Value::from("admin"));
    }
}
