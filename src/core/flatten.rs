use crate::domain::model::{DnsRecord, FlattenedRecord, ProxyFlag, Zone};

/// Joins a zone with each of its DNS records. A zone without records produces
/// no rows.
pub fn flatten(tenant_id: &str, zone: &Zone, records: &[DnsRecord]) -> Vec<FlattenedRecord> {
    if records.is_empty() {
        return Vec::new();
    }

    let tls_mode = zone.tls_mode_or_sentinel();
    let parent_ns_info = zone.name_server_info();

    records
        .iter()
        .map(|record| FlattenedRecord {
            tenant_id: tenant_id.to_string(),
            parent_key: zone.name.clone(),
            parent_status: zone.status.clone(),
            child_name: record.name.clone(),
            child_kind: record.kind.clone(),
            child_value: record.content.clone(),
            notes: String::new(),
            proxy_flag: ProxyFlag::from_source(record.proxied),
            tls_mode: tls_mode.clone(),
            parent_ns_info: parent_ns_info.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Zone {
        Zone {
            id: "023e105f4ecef8ad9ca31a8372d0c353".to_string(),
            name: "example.com".to_string(),
            status: "active".to_string(),
            name_servers: vec!["bob.ns.cloudflare.com".to_string(), "lola.ns.cloudflare.com".to_string()],
            tls_mode: None,
        }
    }

    fn record(name: &str, kind: &str, content: &str, proxied: Option<bool>) -> DnsRecord {
        DnsRecord {
            name: name.to_string(),
            kind: kind.to_string(),
            content: content.to_string(),
            proxied,
        }
    }

    #[test]
    fn test_flatten_one_row_per_record() {
        let records = vec![
            record("www.example.com", "A", "198.51.100.4", Some(true)),
            record("example.com", "MX", "mail.example.com", None),
            record("api.example.com", "CNAME", "lb.example.net", Some(false)),
        ];

        let rows = flatten("acme", &zone(), &records);

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.tenant_id == "acme" && r.parent_key == "example.com"));
        assert!(rows.iter().all(|r| r.notes.is_empty()));
        assert_eq!(rows[0].child_name, "www.example.com");
        assert_eq!(rows[0].child_kind, "A");
        assert_eq!(rows[0].child_value, "198.51.100.4");
        assert_eq!(rows[0].proxy_flag, ProxyFlag::On);
        assert_eq!(rows[1].proxy_flag, ProxyFlag::NotApplicable);
        assert_eq!(rows[1].proxy_flag.as_str(), "false");
        assert_eq!(rows[2].proxy_flag, ProxyFlag::Off);
        assert_eq!(rows[0].tls_mode, "unknown");
        assert_eq!(rows[0].parent_ns_info, "bob.ns.cloudflare.com, lola.ns.cloudflare.com");
    }

    #[test]
    fn test_flatten_without_records_emits_nothing() {
        assert!(flatten("acme", &zone(), &[]).is_empty());
    }

    #[test]
    fn test_flatten_leaves_inputs_untouched() {
        let zone = zone();
        let records = vec![record("www.example.com", "AAAA", "2001:db8::1", Some(true))];
        let before = (zone.clone(), records.clone());

        let first = flatten("acme", &zone, &records);
        let second = flatten("acme", &zone, &records);

        assert_eq!(first, second);
        assert_eq!(before, (zone, records));
    }
}
