use chrono::NaiveDate;
use diesel::prelude::*;

use super::schema::{
    blueprint_slits, design_slits, extended_objects, mask_blueprints, mask_designs,
    nearby_objects, slit_object_map, target_objects,
};
use crate::api::{BlueprintId, BlueprintSlitId, DesignId, DesignSlitId, ObserverId};
use crate::db::models::{
    BlueprintRecord, BlueprintSlitRecord, NewBlueprintSlit, NewDesignSlit, NewExtendedObject,
    NewMaskBlueprint, NewMaskDesign, NewNearbyObject, NewSlitObjectMapping, NewTargetObject,
};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::MillStatus;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mask_designs)]
pub struct NewDesignRow<'a> {
    pub name: &'a str,
    pub author_id: i64,
    pub creator: Option<&'a str>,
    pub design_date: &'a str,
    pub declared_slits: i32,
    pub declared_objects: i32,
    pub project_name: Option<&'a str>,
    pub instrument: &'a str,
    pub mask_type: Option<&'a str>,
    pub ra_pnt: f64,
    pub dec_pnt: f64,
    pub radepnt: Option<&'a str>,
    pub equinox: f64,
    pub pa_pnt: f64,
    pub date_pnt: NaiveDate,
    pub lst_pnt: Option<f64>,
}

impl<'a> From<&'a NewMaskDesign> for NewDesignRow<'a> {
    fn from(d: &'a NewMaskDesign) -> Self {
        Self {
            name: &d.name,
            author_id: d.author.value(),
            creator: d.creator.as_deref(),
            design_date: &d.design_date,
            declared_slits: d.declared_slits,
            declared_objects: d.declared_objects,
            project_name: d.project_name.as_deref(),
            instrument: &d.instrument,
            mask_type: d.mask_type.as_deref(),
            ra_pnt: d.ra_pnt,
            dec_pnt: d.dec_pnt,
            radepnt: d.radepnt.as_deref(),
            equinox: d.equinox,
            pa_pnt: d.pa_pnt,
            date_pnt: d.date_pnt,
            lst_pnt: d.lst_pnt,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mask_blueprints)]
pub struct NewBlueprintRow<'a> {
    pub design_id: i64,
    pub name: &'a str,
    pub gui_name: &'a str,
    pub observer_id: i64,
    pub creator: Option<&'a str>,
    pub blueprint_date: Option<&'a str>,
    pub lst_use: Option<f64>,
    pub date_use: NaiveDate,
    pub telescope: &'a str,
    pub refr_alg: Option<&'a str>,
    pub atm_temp_c: Option<f64>,
    pub atm_pressure: Option<f64>,
    pub atm_humidity: Option<f64>,
    pub atm_lapse_rate: Option<f64>,
    pub ref_wavelength: Option<f64>,
    pub dist_method: Option<&'a str>,
    pub status: i16,
    pub millseq: Option<&'a str>,
}

impl<'a> From<&'a NewMaskBlueprint> for NewBlueprintRow<'a> {
    fn from(b: &'a NewMaskBlueprint) -> Self {
        Self {
            design_id: b.design_id.value(),
            name: &b.name,
            gui_name: &b.gui_name,
            observer_id: b.observer.value(),
            creator: b.creator.as_deref(),
            blueprint_date: b.blueprint_date.as_deref(),
            lst_use: b.lst_use,
            date_use: b.date_use,
            telescope: &b.telescope,
            refr_alg: b.refr_alg.as_deref(),
            atm_temp_c: b.atm_temp_c,
            atm_pressure: b.atm_pressure,
            atm_humidity: b.atm_humidity,
            atm_lapse_rate: b.atm_lapse_rate,
            ref_wavelength: b.ref_wavelength,
            dist_method: b.dist_method.as_deref(),
            status: b.status.as_i16(),
            millseq: b.millseq.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mask_blueprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlueprintRow {
    pub blueprint_id: i64,
    pub design_id: i64,
    pub name: String,
    pub gui_name: String,
    pub observer_id: i64,
    pub telescope: String,
    pub date_use: NaiveDate,
    pub status: i16,
    pub millseq: Option<String>,
}

impl TryFrom<BlueprintRow> for BlueprintRecord {
    type Error = RepositoryError;

    fn try_from(row: BlueprintRow) -> RepositoryResult<Self> {
        let status = MillStatus::from_i16(row.status).ok_or_else(|| {
            RepositoryError::internal(format!(
                "blueprint {} has unknown status {}",
                row.blueprint_id, row.status
            ))
        })?;
        Ok(BlueprintRecord {
            id: BlueprintId(row.blueprint_id),
            design_id: DesignId(row.design_id),
            name: row.name,
            gui_name: row.gui_name,
            observer: ObserverId(row.observer_id),
            telescope: row.telescope,
            date_use: row.date_use,
            status,
            millseq: row.millseq,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = design_slits)]
pub struct NewDesignSlitRow<'a> {
    pub design_id: i64,
    pub slit_ra: f64,
    pub slit_dec: f64,
    pub slit_type: &'static str,
    pub slit_length: f64,
    pub slit_length_pa: f64,
    pub slit_width: f64,
    pub slit_width_pa: f64,
    pub slit_name: Option<&'a str>,
}

impl<'a> From<&'a NewDesignSlit> for NewDesignSlitRow<'a> {
    fn from(s: &'a NewDesignSlit) -> Self {
        Self {
            design_id: s.design_id.value(),
            slit_ra: s.slit_ra,
            slit_dec: s.slit_dec,
            slit_type: s.slit_type.code(),
            slit_length: s.slit_length,
            slit_length_pa: s.slit_length_pa,
            slit_width: s.slit_width,
            slit_width_pa: s.slit_width_pa,
            slit_name: s.slit_name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blueprint_slits)]
pub struct NewBlueprintSlitRow {
    pub blueprint_id: i64,
    pub design_slit_id: i64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
    pub x4: f64,
    pub y4: f64,
    pub bad: bool,
}

impl From<&NewBlueprintSlit> for NewBlueprintSlitRow {
    fn from(s: &NewBlueprintSlit) -> Self {
        let [(x1, y1), (x2, y2), (x3, y3), (x4, y4)] = s.corners;
        Self {
            blueprint_id: s.blueprint_id.value(),
            design_slit_id: s.design_slit_id.value(),
            x1,
            y1,
            x2,
            y2,
            x3,
            y3,
            x4,
            y4,
            bad: s.bad,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blueprint_slits)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlueprintSlitRow {
    pub blueprint_slit_id: i64,
    pub blueprint_id: i64,
    pub design_slit_id: i64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
    pub x4: f64,
    pub y4: f64,
    pub bad: bool,
}

impl From<BlueprintSlitRow> for BlueprintSlitRecord {
    fn from(r: BlueprintSlitRow) -> Self {
        Self {
            id: BlueprintSlitId(r.blueprint_slit_id),
            blueprint_id: BlueprintId(r.blueprint_id),
            design_slit_id: DesignSlitId(r.design_slit_id),
            corners: [(r.x1, r.y1), (r.x2, r.y2), (r.x3, r.y3), (r.x4, r.y4)],
            bad: r.bad,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = target_objects)]
pub struct NewTargetObjectRow<'a> {
    pub name: &'a str,
    pub ra: f64,
    pub dec: f64,
    pub radesys: Option<&'a str>,
    pub equinox: f64,
    pub mjd_obs: Option<f64>,
    pub magnitude: Option<f64>,
    pub pass_band: Option<&'a str>,
    pub radial_velocity: Option<f64>,
    pub class: &'a str,
    pub catalog_file: &'a str,
}

impl<'a> From<&'a NewTargetObject> for NewTargetObjectRow<'a> {
    fn from(o: &'a NewTargetObject) -> Self {
        Self {
            name: &o.name,
            ra: o.ra,
            dec: o.dec,
            radesys: o.radesys.as_deref(),
            equinox: o.equinox,
            mjd_obs: o.mjd_obs,
            magnitude: o.magnitude,
            pass_band: o.pass_band.as_deref(),
            radial_velocity: o.radial_velocity,
            class: &o.class,
            catalog_file: &o.catalog_file,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = extended_objects)]
pub struct NewExtendedObjectRow {
    pub object_id: i64,
    pub major_axis: Option<f64>,
    pub major_axis_pa: Option<f64>,
    pub minor_axis: Option<f64>,
}

impl From<&NewExtendedObject> for NewExtendedObjectRow {
    fn from(e: &NewExtendedObject) -> Self {
        Self {
            object_id: e.object_id.value(),
            major_axis: e.major_axis,
            major_axis_pa: e.major_axis_pa,
            minor_axis: e.minor_axis,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = nearby_objects)]
pub struct NewNearbyObjectRow {
    pub object_id: i64,
    pub pm_ra: Option<f64>,
    pub pm_dec: Option<f64>,
    pub parallax: Option<f64>,
}

impl From<&NewNearbyObject> for NewNearbyObjectRow {
    fn from(n: &NewNearbyObject) -> Self {
        Self {
            object_id: n.object_id.value(),
            pm_ra: n.pm_ra,
            pm_dec: n.pm_dec,
            parallax: n.parallax,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = slit_object_map)]
pub struct NewSlitObjectRow {
    pub design_id: i64,
    pub object_id: i64,
    pub design_slit_id: i64,
    pub top_dist: f64,
    pub bot_dist: f64,
}

impl From<&NewSlitObjectMapping> for NewSlitObjectRow {
    fn from(m: &NewSlitObjectMapping) -> Self {
        Self {
            design_id: m.design_id.value(),
            object_id: m.object_id.value(),
            design_slit_id: m.design_slit_id.value(),
            top_dist: m.top_dist,
            bot_dist: m.bot_dist,
        }
    }
}
