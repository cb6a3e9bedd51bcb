//! The model set: the composition root of a galaxy model.
//!
//! A [`ModelSet`] owns named components in insertion order and keeps a flat
//! view of all their parameters. The flat view is what a fitter sees: free
//! parameters are exchanged through [`ModelSet::update_parameters`] and
//! [`ModelSet::get_free_parameters_values`], and tied parameters are resolved
//! after every update.
//!
//! # Examples
//!
//! ```
//! use galkin_rs::model_set::ModelSet;
//! use galkin_rs::models::{DispersionConst, Geometry, Sersic, ZHeightGauss};
//! use galkin_rs::parameters::Tie;
//!
//! let mut model = ModelSet::new();
//! model.add_component("disk", Sersic::new(10.5, 5.0, 1.0)).unwrap();
//! model.add_component("geom", Geometry::new(60.0, 30.0)).unwrap();
//! model.add_component("disp", DispersionConst::new(40.0)).unwrap();
//! model.add_component("zheight", ZHeightGauss::new(0.5)).unwrap();
//!
//! // Keep the disk as thick as a tenth of its effective radius
//! model.set_parameter_tied("zheight", "sigmaz", Some(Tie::expression("0.1 * disk.r_eff"))).unwrap();
//!
//! let theta = model.get_free_parameters_values();
//! model.update_parameters(&theta).unwrap();
//! assert_eq!(model.parameter_value("zheight", "sigmaz").unwrap(), 0.5);
//! ```

use log::{debug, info, warn};
use ndarray::{Array1, Zip};
use rand::Rng;
use std::collections::HashMap;

use crate::cube::{SimulatedCube, SimulationConfig};
use crate::error::{GalkinError, Result};
use crate::kinematics::{adiabatic_contraction, ContractionReport, KinematicOptions};
use crate::models::{
    Component, Context, DispersionProfile, Flow, Geometry, LightProfile, MassProfile, MassSubtype, Outflow,
    Parameterized, ThinCentralPlaneDustExtinction, ZHeightProfile,
};
use crate::parameters::{EvaluationContext, Expression, ExpressionError, Parameter, Prior, Tie, TieFn};
use crate::utils::{interp_array, sqrt_clipped};

/// How a component is attached to the model set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentOptions {
    /// Slot filled by a geometry, dispersion or z-height component
    pub context: Context,
    /// Whether a mass component also traces the light
    pub light: bool,
}

impl ComponentOptions {
    pub fn light() -> Self {
        Self {
            light: true,
            ..Self::default()
        }
    }

    pub fn in_context(context: Context) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }
}

/// A named component and how it is attached
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    name: String,
    component: Component,
    options: ComponentOptions,
}

impl ComponentEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn context(&self) -> Context {
        self.options.context
    }

    /// Pure light profiles always trace light; mass components only when flagged
    pub fn is_light(&self) -> bool {
        match self.component {
            Component::Light(_) => true,
            Component::Mass(_) => self.options.light,
            _ => false,
        }
    }
}

/// A light-emitting component of the galaxy
#[derive(Debug, Clone, Copy)]
pub enum LightSource<'a> {
    Mass(&'a dyn MassProfile),
    Profile(&'a dyn LightProfile),
}

#[derive(Debug, Clone)]
enum CompiledTie {
    Expression(Expression),
    Function(TieFn),
}

#[derive(Debug, Clone)]
struct TieSlot {
    global: usize,
    tie: CompiledTie,
}

/// Named components plus the flat parameter bookkeeping
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    entries: Vec<ComponentEntry>,
    by_name: HashMap<String, usize>,
    /// component name -> parameter name -> global index
    param_index: HashMap<String, HashMap<String, usize>>,
    /// (component, local index) of every global index
    locations: Vec<(usize, usize)>,
    values: Vec<f64>,
    fixed: Vec<bool>,
    tied: Vec<bool>,
    ties: Vec<TieSlot>,
    geometries: HashMap<Context, usize>,
    dispersions: HashMap<Context, usize>,
    zprofiles: HashMap<Context, usize>,
    kinematic_options: KinematicOptions,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kinematic_options(mut self, options: KinematicOptions) -> Self {
        self.kinematic_options = options;
        self
    }

    pub fn kinematic_options(&self) -> &KinematicOptions {
        &self.kinematic_options
    }

    pub fn set_kinematic_options(&mut self, options: KinematicOptions) {
        self.kinematic_options = options;
    }

    /// Add a component in the galaxy context, not flagged as light
    pub fn add_component(&mut self, name: &str, component: impl Into<Component>) -> Result<()> {
        self.add_component_with(name, component, ComponentOptions::default())
    }

    /// Add a component.
    ///
    /// Names must be unique. A second geometry, dispersion or z-height profile
    /// in the same context takes over the slot; the previous component stays
    /// in the set but is no longer used.
    pub fn add_component_with(
        &mut self,
        name: &str,
        component: impl Into<Component>,
        options: ComponentOptions,
    ) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(GalkinError::DuplicateComponent(name.to_string()));
        }
        let component = component.into();
        let position = self.entries.len();

        let slot = match component {
            Component::Geometry(_) => Some(&mut self.geometries),
            Component::Dispersion(_) => Some(&mut self.dispersions),
            Component::ZHeight(_) => Some(&mut self.zprofiles),
            _ => None,
        };
        if let Some(slot) = slot {
            if let Some(previous) = slot.insert(options.context, position) {
                warn!(
                    "Replacing {} component '{}' in the {:?} context with '{}'",
                    component.kind(),
                    self.entries[previous].name,
                    options.context,
                    name
                );
            }
        }

        self.entries.push(ComponentEntry {
            name: name.to_string(),
            component,
            options,
        });
        self.by_name.insert(name.to_string(), position);
        self.index_component(position)?;

        for message in self.multi_level_ties_touching(position) {
            warn!("{}", message);
        }
        debug!("Added component '{}' ({} parameters in total)", name, self.nparams());
        Ok(())
    }

    /// Rebuild the flat parameter view from the component stores
    pub fn rebuild_index(&mut self) -> Result<()> {
        self.param_index.clear();
        self.locations.clear();
        self.values.clear();
        self.fixed.clear();
        self.tied.clear();
        self.ties.clear();
        for position in 0..self.entries.len() {
            self.index_component(position)?;
        }
        Ok(())
    }

    fn index_component(&mut self, position: usize) -> Result<()> {
        let entry = &self.entries[position];
        let mut names = HashMap::new();
        for (local, param) in entry.component.parameters().iter().enumerate() {
            let global = self.values.len();
            names.insert(param.name().to_string(), global);
            self.locations.push((position, local));
            self.values.push(param.value());
            self.fixed.push(param.is_fixed());
            self.tied.push(param.is_tied());
            if let Some(tie) = param.tied() {
                let tie = match tie {
                    Tie::Expression(expr) => CompiledTie::Expression(Expression::parse(expr)?),
                    Tie::Function(f) => CompiledTie::Function(f.clone()),
                };
                self.ties.push(TieSlot { global, tie });
            }
        }
        self.param_index.insert(entry.name.clone(), names);
        Ok(())
    }

    pub fn nparams(&self) -> usize {
        self.values.len()
    }

    pub fn nparams_free(&self) -> usize {
        (0..self.nparams()).filter(|&g| self.is_free(g)).count()
    }

    pub fn nparams_tied(&self) -> usize {
        self.tied.iter().filter(|&&t| t).count()
    }

    /// Fixed parameters that are not also tied
    pub fn nparams_fixed(&self) -> usize {
        self.fixed
            .iter()
            .zip(self.tied.iter())
            .filter(|&(&f, &t)| f && !t)
            .count()
    }

    fn is_free(&self, global: usize) -> bool {
        !self.fixed[global] && !self.tied[global]
    }

    fn free_indices(&self) -> Vec<usize> {
        (0..self.nparams()).filter(|&g| self.is_free(g)).collect()
    }

    /// Flat vector of every parameter value, in component then parameter order
    pub fn parameter_values(&self) -> &[f64] {
        &self.values
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.entries.iter()
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.by_name.get(name).map(|&i| &self.entries[i].component)
    }

    fn global_index(&self, component: &str, param: &str) -> Result<usize> {
        let params = self
            .param_index
            .get(component)
            .ok_or_else(|| GalkinError::ComponentNotFound(component.to_string()))?;
        params.get(param).copied().ok_or_else(|| GalkinError::ParameterNotFound {
            component: component.to_string(),
            param: param.to_string(),
        })
    }

    fn parameter_at(&self, global: usize) -> Option<&Parameter> {
        let (c, l) = self.locations[global];
        self.entries[c].component.parameters().at(l)
    }

    fn parameter_at_mut(&mut self, global: usize) -> Option<&mut Parameter> {
        let (c, l) = self.locations[global];
        self.entries[c].component.parameters_mut().at_mut(l)
    }

    pub fn parameter(&self, component: &str, param: &str) -> Result<&Parameter> {
        let global = self.global_index(component, param)?;
        self.parameter_at(global).ok_or_else(|| GalkinError::ParameterNotFound {
            component: component.to_string(),
            param: param.to_string(),
        })
    }

    pub fn parameter_value(&self, component: &str, param: &str) -> Result<f64> {
        Ok(self.values[self.global_index(component, param)?])
    }

    /// Write one value into both the component store and the flat vector
    fn assign(&mut self, global: usize, value: f64) {
        if let Some(param) = self.parameter_at_mut(global) {
            param.set_value(value);
        }
        self.values[global] = value;
    }

    /// Set a value and re-resolve the ties
    pub fn set_parameter_value(&mut self, component: &str, param: &str, value: f64) -> Result<()> {
        self.set_parameter_value_deferred(component, param, value)?;
        self.resolve_ties()
    }

    /// Set a value without re-resolving the ties
    pub fn set_parameter_value_deferred(&mut self, component: &str, param: &str, value: f64) -> Result<()> {
        let global = self.global_index(component, param)?;
        self.assign(global, value);
        Ok(())
    }

    pub fn set_parameter_fixed(&mut self, component: &str, param: &str, fixed: bool) -> Result<()> {
        let global = self.global_index(component, param)?;
        if let Some(p) = self.parameter_at_mut(global) {
            p.set_fixed(fixed);
        }
        self.fixed[global] = fixed;
        Ok(())
    }

    /// Attach or remove a tie; the tied value is resolved immediately
    pub fn set_parameter_tied(&mut self, component: &str, param: &str, tie: Option<Tie>) -> Result<()> {
        let global = self.global_index(component, param)?;
        if let Some(Tie::Expression(expr)) = &tie {
            for name in Expression::parse(expr)?.variables() {
                if !self.has_variable(&name) {
                    return Err(ExpressionError::UndefinedVariable { name }.into());
                }
            }
        }
        if let Some(p) = self.parameter_at_mut(global) {
            p.set_tied(tie);
        }
        self.rebuild_index()?;

        let (position, _) = self.locations[global];
        for message in self.multi_level_ties_touching(position) {
            warn!("{}", message);
        }
        self.resolve_ties()
    }

    pub fn set_parameter_prior(&mut self, component: &str, param: &str, prior: Prior) -> Result<()> {
        let global = self.global_index(component, param)?;
        if let Some(p) = self.parameter_at_mut(global) {
            p.set_prior(prior);
        }
        Ok(())
    }

    /// Assign the free parameters from `theta` and resolve every tie.
    ///
    /// Free parameters are filled in component insertion order, then
    /// parameter order; the ties are then evaluated once in the same order.
    pub fn update_parameters(&mut self, theta: &[f64]) -> Result<()> {
        let free = self.free_indices();
        if theta.len() != free.len() {
            return Err(GalkinError::LengthMismatch {
                expected: free.len(),
                found: theta.len(),
            });
        }
        for (&global, &value) in free.iter().zip(theta) {
            self.assign(global, value);
        }
        self.resolve_ties()
    }

    fn resolve_ties(&mut self) -> Result<()> {
        for k in 0..self.ties.len() {
            let value = match &self.ties[k].tie {
                CompiledTie::Expression(expr) => expr.evaluate(&*self)?,
                CompiledTie::Function(f) => f.call(self),
            };
            let global = self.ties[k].global;
            self.assign(global, value);
        }
        Ok(())
    }

    /// Free values in the order used by [`ModelSet::update_parameters`]
    pub fn get_free_parameters_values(&self) -> Vec<f64> {
        self.free_indices().into_iter().map(|g| self.values[g]).collect()
    }

    /// `component -> parameter -> index in the free vector` (None when not free)
    pub fn get_free_parameter_keys(&self) -> HashMap<String, HashMap<String, Option<usize>>> {
        let mut free_position = vec![None; self.nparams()];
        for (k, g) in self.free_indices().into_iter().enumerate() {
            free_position[g] = Some(k);
        }
        self.param_index
            .iter()
            .map(|(component, params)| {
                let params = params
                    .iter()
                    .map(|(name, &g)| (name.clone(), free_position[g]))
                    .collect();
                (component.clone(), params)
            })
            .collect()
    }

    /// `(component, parameter)` names of the free parameters, in order
    pub fn free_parameter_names(&self) -> Vec<(String, String)> {
        self.free_indices()
            .into_iter()
            .filter_map(|g| {
                let (c, _) = self.locations[g];
                self.parameter_at(g)
                    .map(|p| (self.entries[c].name.clone(), p.name().to_string()))
            })
            .collect()
    }

    /// `(reader, target, message)` component positions for every tie that reads
    /// another tied parameter
    fn tie_chains(&self) -> Vec<(usize, usize, String)> {
        let mut chains = Vec::new();
        for slot in &self.ties {
            let (c, _) = self.locations[slot.global];
            let CompiledTie::Expression(expr) = &slot.tie else {
                continue;
            };
            for var in expr.variables() {
                let Some((comp, param)) = var.split_once('.') else {
                    continue;
                };
                if let Ok(g) = self.global_index(comp, param) {
                    if self.tied[g] {
                        let name = self.parameter_at(slot.global).map(|p| p.name()).unwrap_or("?");
                        chains.push((
                            c,
                            self.locations[g].0,
                            format!(
                                "Tie of '{}.{}' reads tied parameter '{}'; ties are resolved in a single pass",
                                self.entries[c].name, name, var
                            ),
                        ));
                    }
                }
            }
        }
        chains
    }

    /// Chains in which the component at `position` reads or is read
    fn multi_level_ties_touching(&self, position: usize) -> Vec<String> {
        self.tie_chains()
            .into_iter()
            .filter(|(reader, target, _)| *reader == position || *target == position)
            .map(|(_, _, message)| message)
            .collect()
    }

    /// Ties whose expression reads another tied parameter
    pub fn tie_dependency_warnings(&self) -> Vec<String> {
        self.tie_chains().into_iter().map(|(_, _, message)| message).collect()
    }

    /// Sum of the log-priors of the free parameters; `-inf` as soon as one is
    pub fn get_log_prior(&self) -> f64 {
        let mut total = 0.0;
        for g in self.free_indices() {
            let lp = self.parameter_at(g).map_or(0.0, |p| p.log_prior());
            if lp == f64::NEG_INFINITY {
                return f64::NEG_INFINITY;
            }
            total += lp;
        }
        total
    }

    /// Map a point of the unit cube to free-parameter values
    pub fn get_prior_transform(&self, u: &[f64]) -> Result<Vec<f64>> {
        let free = self.free_indices();
        if u.len() != free.len() {
            return Err(GalkinError::LengthMismatch {
                expected: free.len(),
                found: u.len(),
            });
        }
        free.iter()
            .zip(u)
            .map(|(&g, &u)| match self.parameter_at(g) {
                Some(p) => Ok(p.prior_transform(u)?),
                None => Ok(f64::NAN),
            })
            .collect()
    }

    /// Draw every free parameter from its prior
    pub fn sample_free_parameters<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<f64>> {
        let mut out = Vec::new();
        for g in self.free_indices() {
            if let Some(p) = self.parameter_at(g) {
                out.push(p.sample_prior(rng)?);
            }
        }
        Ok(out)
    }

    pub fn mass_components(&self) -> impl Iterator<Item = (&str, &dyn MassProfile)> {
        self.entries
            .iter()
            .filter_map(|e| e.component.as_mass().map(|m| (e.name.as_str(), m)))
    }

    pub fn geometry(&self, context: Context) -> Option<&Geometry> {
        match self.geometries.get(&context).map(|&i| &self.entries[i].component) {
            Some(Component::Geometry(g)) => Some(g),
            _ => None,
        }
    }

    pub fn dispersion(&self, context: Context) -> Option<&dyn DispersionProfile> {
        match self.dispersions.get(&context).map(|&i| &self.entries[i].component) {
            Some(Component::Dispersion(d)) => Some(d.as_ref()),
            _ => None,
        }
    }

    pub fn zprofile(&self, context: Context) -> Option<&dyn ZHeightProfile> {
        match self.zprofiles.get(&context).map(|&i| &self.entries[i].component) {
            Some(Component::ZHeight(z)) => Some(z.as_ref()),
            _ => None,
        }
    }

    pub fn light_components(&self) -> impl Iterator<Item = (&str, LightSource<'_>)> {
        self.entries.iter().filter(|e| e.is_light()).filter_map(|e| {
            let source = match &e.component {
                Component::Mass(m) => LightSource::Mass(m.as_ref()),
                Component::Light(l) => LightSource::Profile(l.as_ref()),
                _ => return None,
            };
            Some((e.name.as_str(), source))
        })
    }

    pub fn outflows(&self) -> impl Iterator<Item = (&str, &Outflow)> {
        self.entries.iter().filter_map(|e| match &e.component {
            Component::Outflow(o) => Some((e.name.as_str(), o)),
            _ => None,
        })
    }

    pub fn flows(&self) -> impl Iterator<Item = (&str, &Flow)> {
        self.entries.iter().filter_map(|e| match &e.component {
            Component::Flow(f) => Some((e.name.as_str(), f)),
            _ => None,
        })
    }

    /// The first extinction component, if any
    pub fn extinction(&self) -> Option<&ThinCentralPlaneDustExtinction> {
        self.entries.iter().find_map(|e| match &e.component {
            Component::Extinction(x) => Some(x),
            _ => None,
        })
    }

    /// Total enclosed mass [Msun]
    pub fn enclosed_mass(&self, r: &Array1<f64>) -> Array1<f64> {
        self.mass_components()
            .fold(Array1::zeros(r.len()), |acc, (_, m)| acc + m.enclosed_mass(r))
    }

    /// Squared circular velocities summed per subtype: (baryonic, dark matter, combined)
    fn velocity_sq_by_subtype(&self, r: &Array1<f64>) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>)> {
        let mut vbar = Array1::zeros(r.len());
        let mut vdm = Array1::zeros(r.len());
        let mut vcomb = Array1::zeros(r.len());
        for (_, m) in self.mass_components() {
            let v = m.circular_velocity(r)?;
            let target = match m.subtype() {
                MassSubtype::Baryonic => &mut vbar,
                MassSubtype::DarkMatter => &mut vdm,
                MassSubtype::Combined => &mut vcomb,
            };
            Zip::from(target).and(&v).for_each(|t, &v| *t += v * v);
        }
        Ok((vbar, vdm, vcomb))
    }

    /// Circular velocity of all mass components added in quadrature, with no
    /// kinematic options applied [km/s]
    pub fn circular_velocity(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        let (vbar, vdm, vcomb) = self.velocity_sq_by_subtype(r)?;
        Ok((vbar + vdm + vcomb).mapv(f64::sqrt))
    }

    /// Squared (baryonic, halo, combined) velocities with the halo contracted
    /// when the option is on
    fn contracted_velocity_sq(
        &self,
        r: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>, Option<ContractionReport>)> {
        let has_halo = self.mass_components().any(|(_, m)| m.subtype() == MassSubtype::DarkMatter);
        if !self.kinematic_options.adiabatic_contract || !has_halo {
            let (vbar, vdm, vcomb) = self.velocity_sq_by_subtype(r)?;
            return Ok((vbar, vdm, vcomb, None));
        }

        info!("Applying adiabatic contraction");
        let grid = self.kinematic_options.contraction_grid()?;
        let (vbar_sq, vdm_sq, vcomb_sq) = self.velocity_sq_by_subtype(&grid)?;
        let (vdm_adi, report) = adiabatic_contraction(&grid, &vbar_sq.mapv(f64::sqrt), &vdm_sq.mapv(f64::sqrt));
        if report.n_failed > 0 {
            warn!(
                "Adiabatic contraction did not converge at {} of {} radii",
                report.n_failed, report.n_radii
            );
        }

        let grid = grid.to_vec();
        let r_abs = r.mapv(f64::abs);
        let vdm_adi_sq = vdm_adi.mapv(|v| v * v).to_vec();
        Ok((
            interp_array(&grid, &vbar_sq.to_vec(), &r_abs),
            interp_array(&grid, &vdm_adi_sq, &r_abs),
            interp_array(&grid, &vcomb_sq.to_vec(), &r_abs),
            Some(report),
        ))
    }

    /// Rotation velocity after adiabatic contraction and pressure support
    pub fn velocity_profile(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.velocity_profile_with_report(r)?.0)
    }

    /// [`ModelSet::velocity_profile`] plus the contraction diagnostics
    pub fn velocity_profile_with_report(
        &self,
        r: &Array1<f64>,
    ) -> Result<(Array1<f64>, Option<ContractionReport>)> {
        let (vbar, vdm, vcomb, report) = self.contracted_velocity_sq(r)?;
        let vcirc = (vbar + vdm + vcomb).mapv(sqrt_clipped);
        let vrot = self.kinematic_options.apply_pressure_support(self, r, &vcirc)?;
        Ok((vrot, report))
    }

    /// Dark matter fraction `v_dm^2 / v_circ^2` within each radius
    pub fn get_dm_aper(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        let (vbar, vdm, vcomb, _) = self.contracted_velocity_sq(r)?;
        let mut frac = Array1::zeros(r.len());
        Zip::from(&mut frac)
            .and(&vbar)
            .and(&vdm)
            .and(&vcomb)
            .for_each(|f, &b, &d, &c| {
                let total = b + d + c;
                *f = if total > 0.0 { d / total } else { 0.0 };
            });
        Ok(frac)
    }

    /// Virial mass of halo `halo` that reproduces its `fdm` at `r_fdm`
    /// together with every baryonic component.
    ///
    /// Meant for tie functions, e.g.
    /// `Tie::function(|m| m.halo_mvirial_from_fdm("halo", 5.0).unwrap_or(f64::NAN))`.
    pub fn halo_mvirial_from_fdm(&self, halo: &str, r_fdm: f64) -> Result<f64> {
        let component = self
            .component(halo)
            .ok_or_else(|| GalkinError::ComponentNotFound(halo.to_string()))?;
        let profile = component
            .as_mass()
            .and_then(|m| m.as_halo())
            .ok_or_else(|| GalkinError::Configuration(format!("component '{}' is not a dark matter halo", halo)))?;
        let baryons: Vec<&dyn MassProfile> = self
            .mass_components()
            .filter(|(_, m)| m.subtype() == MassSubtype::Baryonic)
            .map(|(_, m)| m)
            .collect();
        profile.calc_mvirial_from_fdm(&baryons, r_fdm)
    }

    /// Project the model into a spectral cube; see [`crate::cube`]
    pub fn simulate_cube(&self, config: &SimulationConfig) -> Result<SimulatedCube> {
        crate::cube::simulate(self, config)
    }
}

impl EvaluationContext for ModelSet {
    fn get_variable(&self, name: &str) -> std::result::Result<f64, ExpressionError> {
        name.split_once('.')
            .and_then(|(component, param)| self.global_index(component, param).ok())
            .map(|g| self.values[g])
            .ok_or_else(|| ExpressionError::UndefinedVariable { name: name.to_string() })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.get_variable(name).is_ok()
    }
}
