/// Shifts an elementary stream's timestamps so that the first one observed
/// lands on `base` (zero until a discontinuity re-arms it).
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TimestampRebaser {
    offset: Option<i64>,
    base: i64,
}

impl TimestampRebaser {
    /// Rebases a PTS/DTS pair. The first call captures the offset from `pts`.
    pub(crate) fn rebase(&mut self, pts: i64, dts: i64) -> (i64, i64) {
        let offset = *self.offset.get_or_insert(pts - self.base);
        (pts - offset, dts - offset)
    }

    /// Forgets the captured offset so the next timestamp maps to `base`.
    pub(crate) fn rearm(&mut self, base: i64) {
        self.offset = None;
        self.base = base;
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_first_pts_sets_offset() {
        let mut rebaser = TimestampRebaser::default();
        assert_eq!(rebaser.rebase(10_000, 9_960), (0, -40));
        assert_eq!(rebaser.rebase(10_040, 10_000), (40, 0));
    }

    #[test]
    fn test_rearm_continues_from_base() {
        let mut rebaser = TimestampRebaser::default();
        rebaser.rebase(5_000, 5_000);
        rebaser.rearm(2_000);
        assert_eq!(rebaser.rebase(90, 90), (2_000, 2_000));
        assert_eq!(rebaser.rebase(130, 110), (2_040, 2_020));
    }
}
