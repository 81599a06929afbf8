// Value resolver - one number per zone for the active view
use crate::domain::lmp::PriceType;
use crate::domain::view::DataSource;

/// Resolves zone values for a price type, applying the relative congestion
/// transform when a reference zone is set.
#[derive(Debug, Clone, Copy)]
pub struct ValueResolver<'a> {
    price_type: PriceType,
    reference_zone: Option<&'a str>,
}

impl<'a> ValueResolver<'a> {
    pub fn new(price_type: PriceType, reference_zone: Option<&'a str>) -> Self {
        Self {
            price_type,
            reference_zone,
        }
    }

    pub fn resolve(&self, zone: &str, source: &DataSource<'_>) -> Option<f64> {
        match self.price_type {
            PriceType::Congestion => self.resolve_congestion(zone, source),
            variant => source.reading(zone).and_then(|r| r.get(variant)),
        }
    }

    /// Real-time cost of delivering from `zone` into the reference zone:
    /// `reference.rt - zone.rt`, identical for stepped and averaged sources.
    /// A reference without rt data leaves every zone unresolved, itself included.
    fn resolve_congestion(&self, zone: &str, source: &DataSource<'_>) -> Option<f64> {
        let reference = self.reference_zone?;
        let reference_rt = source.reading(reference)?.rt?;
        if zone == reference {
            return Some(0.0);
        }
        let zone_rt = source.reading(zone)?.rt?;
        Some(reference_rt - zone_rt)
    }

    /// Mean resolved value across `zones`, skipping zones without a value and
    /// the reference zone itself in congestion mode.
    pub fn network_aggregate<'z, I>(&self, zones: I, source: &DataSource<'_>) -> Option<f64>
    where
        I: IntoIterator<Item = &'z str>,
    {
        let excluded = match self.price_type {
            PriceType::Congestion => self.reference_zone,
            _ => None,
        };
        let (sum, count) = zones
            .into_iter()
            .filter(|zone| Some(*zone) != excluded)
            .filter_map(|zone| self.resolve(zone, source))
            .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}
