//! nsupdate script builder
//!
//! An update replaces every record of one name:
//!
//! ```text
//! server ns1.example.com          (only with a remote server)
//! zone dyn.example.com
//! update delete foo.dyn.example.com
//! update add foo.dyn.example.com 300 A 10.1.1.1
//! update add foo.dyn.example.com 300 AAAA 2001:db8::1
//! send
//! quit
//! ```

use std::fmt;

use crate::address::AddressSet;

/// A line-oriented nsupdate script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateScript {
    directives: Vec<String>,
}

impl UpdateScript {
    /// Build the script that replaces the records of `fqdn` with `addresses`
    ///
    /// # Parameters
    ///
    /// - `server`: Optional remote nameserver
    /// - `zone`: Zone the name lives in
    /// - `fqdn`: Fully-qualified name to replace
    /// - `ttl`: TTL for the added records
    /// - `addresses`: Addresses to add; the tag of each picks A or AAAA
    pub fn replace(
        server: Option<&str>,
        zone: &str,
        fqdn: &str,
        ttl: u32,
        addresses: &AddressSet,
    ) -> Self {
        debug_assert!(
            !fqdn.is_empty() && !fqdn.contains(char::is_whitespace),
            "fqdn {:?} would break the script",
            fqdn
        );
        let mut directives = Vec::with_capacity(addresses.len() + 5);

        if let Some(server) = server {
            directives.push(format!("server {}", server));
        }
        directives.push(format!("zone {}", zone));
        directives.push(format!("update delete {}", fqdn));
        for (record_type, ip) in addresses.records() {
            directives.push(format!("update add {} {} {} {}", fqdn, ttl, record_type, ip));
        }
        directives.push("send".to_string());
        directives.push("quit".to_string());

        Self { directives }
    }

    /// The individual directives, in order
    pub fn directives(&self) -> &[String] {
        &self.directives
    }
}

impl fmt::Display for UpdateScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in &self.directives {
            writeln!(f, "{}", directive)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn set(ips: &[&str]) -> AddressSet {
        ips.iter().map(|s| s.parse::<IpAddr>().unwrap()).collect()
    }

    #[test]
    fn test_single_ipv4() {
        let script = UpdateScript::replace(
            None,
            "dyn.example.com",
            "foo.dyn.example.com",
            300,
            &set(&["10.1.1.1"]),
        );
        assert_eq!(
            script.to_string(),
            "zone dyn.example.com\n\
             update delete foo.dyn.example.com\n\
             update add foo.dyn.example.com 300 A 10.1.1.1\n\
             send\n\
             quit\n"
        );
    }

    #[test]
    fn test_server_directive_first() {
        let script = UpdateScript::replace(
            Some("ns1.example.com"),
            "dyn.example.com",
            "foo.dyn.example.com",
            300,
            &set(&["10.1.1.1"]),
        );
        assert_eq!(script.directives()[0], "server ns1.example.com");
        assert_eq!(script.directives()[1], "zone dyn.example.com");
    }

    #[test]
    fn test_directives_reparse() {
        let addresses = set(&["2001:db8::1", "10.1.1.1", "192.0.2.9"]);
        let script = UpdateScript::replace(
            None,
            "dyn.example.com",
            "bar.dyn.example.com",
            60,
            &addresses,
        );

        let mut deletes = Vec::new();
        let mut adds = Vec::new();
        for line in script.to_string().lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["update", "delete", name] => deletes.push(name.to_string()),
                ["update", "add", name, ttl, rtype, ip] => {
                    assert_eq!(*name, "bar.dyn.example.com");
                    assert_eq!(*ttl, "60");
                    let ip: IpAddr = ip.parse().unwrap();
                    let expected = if ip.is_ipv4() { "A" } else { "AAAA" };
                    assert_eq!(*rtype, expected);
                    adds.push(ip);
                }
                _ => {}
            }
        }

        assert_eq!(deletes, vec!["bar.dyn.example.com".to_string()]);
        assert_eq!(adds.len(), 3);
        assert_eq!(adds.into_iter().collect::<AddressSet>(), addresses);

        let tail: Vec<_> = script.directives().iter().rev().take(2).collect();
        assert_eq!(tail, vec!["quit", "send"]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "would break the script")]
    fn test_multiline_fqdn_is_refused() {
        UpdateScript::replace(
            None,
            "dyn.example.com",
            "foo\nupdate delete www.dyn.example.com",
            300,
            &set(&["10.1.1.1"]),
        );
    }
}
