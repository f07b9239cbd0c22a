//! CSV output of the synthesized route tables.

use super::terminal::format_field;
use crate::models::{Network, RouteTarget};
use colored::Colorize;

/// One route entry, flattened for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePrintRow {
    pub network: String,
    pub table: String,
    pub destination: String,
    pub target: String,
    pub kind: &'static str,
}

fn kind_of(target: &RouteTarget) -> &'static str {
    if target.is_egress() {
        "egress"
    } else {
        "connector"
    }
}

/// Rows for every route of every table, in table order.
pub fn route_rows<'a>(networks: impl IntoIterator<Item = &'a Network>) -> Vec<RoutePrintRow> {
    let mut rows = Vec::new();
    for network in networks {
        for table in network.route_tables() {
            for entry in table.entries() {
                rows.push(RoutePrintRow {
                    network: network.id().to_string(),
                    table: table.id.to_string(),
                    destination: entry.destination.to_string(),
                    target: entry.target.to_string(),
                    kind: kind_of(&entry.target),
                });
            }
            for gateway in &table.propagating_gateways {
                rows.push(RoutePrintRow {
                    network: network.id().to_string(),
                    table: table.id.to_string(),
                    destination: "propagated".to_string(),
                    target: format!("vpn_gateway:{gateway}"),
                    kind: "vpn",
                });
            }
        }
    }
    rows
}

pub fn format_csv_row(row: &RoutePrintRow) -> String {
    format!(
        "{network},{table},{destination},{target},{kind}",
        network = format_field(&row.network, 18),
        table = format_field(&row.table, 34),
        destination = format_field(&row.destination, 16),
        target = format_field(&row.target, 44),
        kind = format_field(row.kind, 11),
    )
}

/// Print all route tables of `networks` as CSV to stdout.
pub fn print_routes<'a>(networks: impl IntoIterator<Item = &'a Network>) {
    let rows = route_rows(networks);
    log::info!("#Start print_routes() rows={}", rows.len());
    println!(
        r#"         "network",                             "table",    "destination",                                     "target",      "kind""#
    );
    for row in &rows {
        let line = format_csv_row(row);
        if row.kind == "connector" {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
    println!("#{}# {} route rows", "NOTE".on_red(), rows.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{NetworkBuilder, PeeringConnector};

    #[test]
    fn test_route_rows_after_peering() {
        let mut nets = NetworkBuilder::new("peers")
            .build_blocks(&["10.0.0.0/24", "10.0.1.0/24"], Some(1))
            .unwrap();
        let (left, right) = nets.split_at_mut(1);
        PeeringConnector::connect(&mut left[0], &mut right[0]).unwrap();

        let rows = route_rows(&nets);
        // per network: igw route on the public table, nat + peering on the private one
        assert_eq!(rows.len(), 6);
        let peering: Vec<_> = rows.iter().filter(|r| r.kind == "connector").collect();
        assert_eq!(peering.len(), 2);
        assert_eq!(peering[0].destination, "10.0.1.0/24");
        assert!(peering[0].target.starts_with("peering_link:"));
    }

    #[test]
    fn test_format_csv_row() {
        let row = RoutePrintRow {
            network: "n".to_string(),
            table: "t".to_string(),
            destination: "10.0.0.0/24".to_string(),
            target: "transit_hub:hub".to_string(),
            kind: "connector",
        };
        let line = format_csv_row(&row);
        assert_eq!(line.split(',').count(), 5);
        assert!(line.ends_with("\"connector\""));
    }
}
