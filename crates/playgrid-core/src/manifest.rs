//! Cluster object bodies for a session.
//!
//! A session is backed by three objects:
//!
//! ```text
//! {session}-home   PersistentVolumeClaim  ─┐
//! {session}-games  PersistentVolumeClaim  ─┤ mounted by
//! {session}        StatefulSet (1 replica) ◄┘
//! ```
//!
//! Objects are built directly as `k8s-openapi` types, so any cluster client
//! can submit them as-is. Building is pure: identical inputs always
//! serialize to identical bytes.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::SessionIdentity;
use crate::tier::ResourceProfile;

pub use appsv1::StatefulSet;
pub use corev1::PersistentVolumeClaim;

pub const HOME_VOLUME: &str = "home-dir";
pub const GAMES_VOLUME: &str = "games-dir";
pub const INPUT_VOLUME: &str = "input-devices";
pub const SHM_VOLUME: &str = "dshm";

pub const HOME_MOUNT_PATH: &str = "/home/default/";
pub const GAMES_MOUNT_PATH: &str = "/mnt/games/";
pub const INPUT_DEVICE_PATH: &str = "/dev/input/";
pub const SHM_MOUNT_PATH: &str = "/dev/shm";

/// uid/gid the steam-headless image runs as.
const CONTAINER_USER_ID: i64 = 1000;

const MAX_NAME_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("invalid object name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("{field} must be greater than zero")]
    ZeroQuantity { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

// ── Workload template ──────────────────────────────────────────────

/// Deploy-time knobs for the session workload. Never varies per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadTemplate {
    pub storage_class: String,
    pub image: String,
    pub container_name: String,
    /// Remote-access port, exposed 1:1 on the host network.
    pub port: u16,
    /// Shared-accelerator limit attached to the container, if any.
    pub gpu: Option<GpuShare>,
    pub timezone: String,
    pub locales: String,
    pub display: String,
}

/// Extended resource granting a slice of a shared GPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuShare {
    pub resource: String,
    pub amount: u32,
}

impl Default for WorkloadTemplate {
    fn default() -> Self {
        Self {
            storage_class: "openebs-hostpath".to_string(),
            image: "josh5/steam-headless:latest".to_string(),
            container_name: "steam-headless".to_string(),
            port: 8083,
            gpu: Some(GpuShare {
                resource: "nvidia.com/gpu.shared".to_string(),
                amount: 1,
            }),
            timezone: "America/New_York".to_string(),
            locales: "en_US.UTF-8 UTF-8".to_string(),
            display: ":55".to_string(),
        }
    }
}

impl WorkloadTemplate {
    pub fn validate(&self) -> ManifestResult<()> {
        non_empty("storage_class", &self.storage_class)?;
        non_empty("image", &self.image)?;
        validate_name(&self.container_name)?;
        if self.port == 0 {
            return Err(ManifestError::ZeroQuantity { field: "port" });
        }
        if let Some(gpu) = &self.gpu {
            non_empty("gpu.resource", &gpu.resource)?;
            if gpu.amount == 0 {
                return Err(ManifestError::ZeroQuantity {
                    field: "gpu.amount",
                });
            }
        }
        Ok(())
    }
}

/// Name of a built object. Builders always set it.
pub trait ObjectName {
    fn object_name(&self) -> &str;
}

impl ObjectName for PersistentVolumeClaim {
    fn object_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

impl ObjectName for StatefulSet {
    fn object_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

// ── Builders ───────────────────────────────────────────────────────

/// The three objects that make up one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSet {
    pub home_claim: PersistentVolumeClaim,
    pub games_claim: PersistentVolumeClaim,
    pub workload: StatefulSet,
}

pub fn home_claim_name(session_id: &str) -> String {
    format!("{session_id}-home")
}

pub fn games_claim_name(session_id: &str) -> String {
    format!("{session_id}-games")
}

/// Claim for the user's home directory.
pub fn home_claim(
    identity: &SessionIdentity,
    profile: &ResourceProfile,
    template: &WorkloadTemplate,
) -> ManifestResult<PersistentVolumeClaim> {
    storage_claim(
        &home_claim_name(&identity.session_id),
        profile.home_storage_gib,
        "home_storage_gib",
        template,
    )
}

/// Claim for the game library.
pub fn games_claim(
    identity: &SessionIdentity,
    profile: &ResourceProfile,
    template: &WorkloadTemplate,
) -> ManifestResult<PersistentVolumeClaim> {
    storage_claim(
        &games_claim_name(&identity.session_id),
        profile.games_storage_gib,
        "games_storage_gib",
        template,
    )
}

fn storage_claim(
    name: &str,
    gib: u32,
    field: &'static str,
    template: &WorkloadTemplate,
) -> ManifestResult<PersistentVolumeClaim> {
    validate_name(name)?;
    if gib == 0 {
        return Err(ManifestError::ZeroQuantity { field });
    }
    non_empty("storage_class", &template.storage_class)?;

    Ok(PersistentVolumeClaim {
        metadata: metav1::ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(corev1::PersistentVolumeClaimSpec {
            storage_class_name: Some(template.storage_class.clone()),
            volume_mode: Some("Filesystem".to_string()),
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(corev1::VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(format!("{gib}Gi")),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Single-replica StatefulSet running the remote-desktop container.
pub fn workload(
    identity: &SessionIdentity,
    profile: &ResourceProfile,
    template: &WorkloadTemplate,
) -> ManifestResult<StatefulSet> {
    let session_id = identity.session_id.as_str();
    validate_name(session_id)?;
    template.validate()?;
    if profile.cpu_millis == 0 {
        return Err(ManifestError::ZeroQuantity { field: "cpu_millis" });
    }
    if profile.memory_mib == 0 {
        return Err(ManifestError::ZeroQuantity { field: "memory_mib" });
    }

    let labels = BTreeMap::from([("app".to_string(), session_id.to_string())]);

    let requests = BTreeMap::from([
        ("cpu".to_string(), Quantity(format!("{}m", profile.cpu_millis))),
        ("memory".to_string(), Quantity(format!("{}Mi", profile.memory_mib))),
    ]);
    let mut limits = requests.clone();
    if let Some(gpu) = &template.gpu {
        limits.insert(gpu.resource.clone(), Quantity(gpu.amount.to_string()));
    }

    let port = i32::from(template.port);

    let container = corev1::Container {
        name: template.container_name.clone(),
        image: Some(template.image.clone()),
        security_context: Some(corev1::SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }),
        resources: Some(corev1::ResourceRequirements {
            requests: Some(requests),
            limits: Some(limits),
            ..Default::default()
        }),
        volume_mounts: Some(vec![
            mount(HOME_VOLUME, HOME_MOUNT_PATH),
            mount(GAMES_VOLUME, GAMES_MOUNT_PATH),
            mount(INPUT_VOLUME, INPUT_DEVICE_PATH),
            mount(SHM_VOLUME, SHM_MOUNT_PATH),
        ]),
        env: Some(session_env(identity, template)),
        ports: Some(vec![corev1::ContainerPort {
            container_port: port,
            host_port: Some(port),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let volumes = vec![
        claim_volume(HOME_VOLUME, home_claim_name(session_id)),
        claim_volume(GAMES_VOLUME, games_claim_name(session_id)),
        corev1::Volume {
            name: INPUT_VOLUME.to_string(),
            host_path: Some(corev1::HostPathVolumeSource {
                path: INPUT_DEVICE_PATH.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        },
        corev1::Volume {
            name: SHM_VOLUME.to_string(),
            empty_dir: Some(corev1::EmptyDirVolumeSource {
                medium: Some("Memory".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    Ok(StatefulSet {
        metadata: metav1::ObjectMeta {
            name: Some(session_id.to_string()),
            ..Default::default()
        },
        spec: Some(appsv1::StatefulSetSpec {
            // Plain or optional depending on the API version feature.
            service_name: session_id.to_string().into(),
            replicas: Some(1),
            selector: metav1::LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: corev1::PodTemplateSpec {
                metadata: Some(metav1::ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(corev1::PodSpec {
                    host_network: Some(true),
                    security_context: Some(corev1::PodSecurityContext {
                        fs_group: Some(CONTAINER_USER_ID),
                        ..Default::default()
                    }),
                    containers: vec![container],
                    volumes: Some(volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Build all three objects for a session.
pub fn build_object_set(
    identity: &SessionIdentity,
    profile: &ResourceProfile,
    template: &WorkloadTemplate,
) -> ManifestResult<ObjectSet> {
    Ok(ObjectSet {
        home_claim: home_claim(identity, profile, template)?,
        games_claim: games_claim(identity, profile, template)?,
        workload: workload(identity, profile, template)?,
    })
}

fn mount(name: &str, path: &str) -> corev1::VolumeMount {
    corev1::VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        ..Default::default()
    }
}

fn claim_volume(name: &str, claim_name: String) -> corev1::Volume {
    corev1::Volume {
        name: name.to_string(),
        persistent_volume_claim: Some(corev1::PersistentVolumeClaimVolumeSource {
            claim_name,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Runtime configuration for the steam-headless image.
fn session_env(identity: &SessionIdentity, template: &WorkloadTemplate) -> Vec<corev1::EnvVar> {
    let creds = &identity.credentials;
    let uid = CONTAINER_USER_ID.to_string();
    let port = template.port.to_string();
    [
        ("NAME", "SteamHeadless"),
        ("TZ", template.timezone.as_str()),
        ("USER_LOCALES", template.locales.as_str()),
        ("DISPLAY", template.display.as_str()),
        ("SHM_SIZE", "2G"),
        ("DOCKER_RUNTIME", "nvidia"),
        ("PUID", uid.as_str()),
        ("PGID", uid.as_str()),
        ("UMASK", "000"),
        ("USER_PASSWORD", creds.password.as_str()),
        ("MODE", "primary"),
        ("WEB_UI_MODE", "vnc"),
        ("ENABLE_VNC_AUDIO", "false"),
        ("PORT_NOVNC_WEB", port.as_str()),
        ("ENABLE_SUNSHINE", "true"),
        ("SUNSHINE_USER", creds.username.as_str()),
        ("SUNSHINE_PASS", creds.password.as_str()),
    ]
    .into_iter()
    .map(|(name, value)| corev1::EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    })
    .collect()
}

fn non_empty(field: &'static str, value: &str) -> ManifestResult<()> {
    if value.trim().is_empty() {
        return Err(ManifestError::Empty { field });
    }
    Ok(())
}

/// RFC 1123 label: lowercase alphanumerics and '-', alnum at both ends.
fn validate_name(name: &str) -> ManifestResult<()> {
    let invalid = |reason| ManifestError::InvalidName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("longer than 63 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(invalid("only lowercase alphanumerics and '-' are allowed"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with an alphanumeric character"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Credentials;
    use crate::tier;

    fn identity() -> SessionIdentity {
        SessionIdentity {
            session_id: "steam-ab12".to_string(),
            credentials: Credentials {
                username: "user-qwert".to_string(),
                password: "Abc123Def456".to_string(),
            },
        }
    }

    fn storage(claim: &PersistentVolumeClaim) -> &str {
        let requests = claim
            .spec
            .as_ref()
            .and_then(|s| s.resources.as_ref())
            .and_then(|r| r.requests.as_ref())
            .unwrap();
        &requests["storage"].0
    }

    fn pod(ss: &StatefulSet) -> &corev1::PodSpec {
        ss.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
    }

    fn container(ss: &StatefulSet) -> &corev1::Container {
        &pod(ss).containers[0]
    }

    fn resources(ss: &StatefulSet) -> &corev1::ResourceRequirements {
        container(ss).resources.as_ref().unwrap()
    }

    fn env<'a>(ss: &'a StatefulSet, name: &str) -> Option<&'a str> {
        container(ss)
            .env
            .as_ref()?
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_deref())
    }

    #[test]
    fn small_tier_quantities() {
        let profile = tier::lookup("small").unwrap();
        let set = build_object_set(&identity(), &profile, &WorkloadTemplate::default()).unwrap();

        assert_eq!(set.home_claim.object_name(), "steam-ab12-home");
        assert_eq!(storage(&set.home_claim), "50Gi");
        assert_eq!(set.games_claim.object_name(), "steam-ab12-games");
        assert_eq!(storage(&set.games_claim), "400Gi");

        let requests = resources(&set.workload).requests.as_ref().unwrap();
        assert_eq!(requests["cpu"], Quantity("6000m".into()));
        assert_eq!(requests["memory"], Quantity("24576Mi".into()));
    }

    #[test]
    fn every_tier_matches_its_profile() {
        let template = WorkloadTemplate::default();
        for (name, profile) in tier::all() {
            let set = build_object_set(&identity(), &profile, &template).unwrap();
            assert_eq!(
                storage(&set.home_claim),
                format!("{}Gi", profile.home_storage_gib),
                "{name}"
            );
            assert_eq!(
                storage(&set.games_claim),
                format!("{}Gi", profile.games_storage_gib),
                "{name}"
            );

            let r = resources(&set.workload);
            let cpu = Quantity(format!("{}m", profile.cpu_millis));
            let memory = Quantity(format!("{}Mi", profile.memory_mib));
            for map in [r.requests.as_ref().unwrap(), r.limits.as_ref().unwrap()] {
                assert_eq!(map["cpu"], cpu, "{name}");
                assert_eq!(map["memory"], memory, "{name}");
            }
        }
    }

    #[test]
    fn limits_carry_gpu_share_only() {
        let profile = tier::lookup("large").unwrap();
        let ss = workload(&identity(), &profile, &WorkloadTemplate::default()).unwrap();
        let r = resources(&ss);
        assert_eq!(
            r.limits.as_ref().unwrap()["nvidia.com/gpu.shared"],
            Quantity("1".into())
        );
        assert!(
            !r.requests
                .as_ref()
                .unwrap()
                .contains_key("nvidia.com/gpu.shared")
        );
    }

    #[test]
    fn gpu_share_can_be_disabled() {
        let template = WorkloadTemplate {
            gpu: None,
            ..WorkloadTemplate::default()
        };
        let profile = tier::lookup("medium").unwrap();
        let ss = workload(&identity(), &profile, &template).unwrap();
        assert_eq!(resources(&ss).limits.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn claims_share_class_and_access_mode() {
        let profile = tier::lookup("medium").unwrap();
        let set = build_object_set(&identity(), &profile, &WorkloadTemplate::default()).unwrap();
        for claim in [&set.home_claim, &set.games_claim] {
            let spec = claim.spec.as_ref().unwrap();
            assert_eq!(spec.storage_class_name.as_deref(), Some("openebs-hostpath"));
            assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
            assert_eq!(spec.volume_mode.as_deref(), Some("Filesystem"));
        }
    }

    #[test]
    fn workload_shape() {
        let profile = tier::lookup("small").unwrap();
        let ss = workload(&identity(), &profile, &WorkloadTemplate::default()).unwrap();

        assert_eq!(ss.object_name(), "steam-ab12");
        let spec = ss.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(
            spec.selector.match_labels.as_ref().unwrap()["app"],
            "steam-ab12"
        );
        let pod_labels = spec.template.metadata.as_ref().unwrap().labels.as_ref().unwrap();
        assert_eq!(pod_labels["app"], "steam-ab12");

        let pod = pod(&ss);
        assert_eq!(pod.host_network, Some(true));
        assert_eq!(pod.security_context.as_ref().unwrap().fs_group, Some(1000));

        let c = container(&ss);
        assert_eq!(c.security_context.as_ref().unwrap().privileged, Some(true));
        assert_eq!(c.image.as_deref(), Some("josh5/steam-headless:latest"));
        let ports = c.ports.as_ref().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].container_port, 8083);
        assert_eq!(ports[0].host_port, Some(8083));
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
    }

    #[test]
    fn workload_mounts_both_claims() {
        let profile = tier::lookup("small").unwrap();
        let ss = workload(&identity(), &profile, &WorkloadTemplate::default()).unwrap();

        let claims: Vec<&str> = pod(&ss)
            .volumes
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|v| v.persistent_volume_claim.as_ref())
            .map(|c| c.claim_name.as_str())
            .collect();
        assert_eq!(claims, vec!["steam-ab12-home", "steam-ab12-games"]);

        let mounts: Vec<(&str, &str)> = container(&ss)
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| (m.name.as_str(), m.mount_path.as_str()))
            .collect();
        assert_eq!(
            mounts,
            vec![
                ("home-dir", "/home/default/"),
                ("games-dir", "/mnt/games/"),
                ("input-devices", "/dev/input/"),
                ("dshm", "/dev/shm"),
            ]
        );
    }

    #[test]
    fn credentials_injected_as_env() {
        let profile = tier::lookup("small").unwrap();
        let ss = workload(&identity(), &profile, &WorkloadTemplate::default()).unwrap();
        assert_eq!(env(&ss, "SUNSHINE_USER"), Some("user-qwert"));
        assert_eq!(env(&ss, "SUNSHINE_PASS"), Some("Abc123Def456"));
        assert_eq!(env(&ss, "USER_PASSWORD"), Some("Abc123Def456"));
        assert_eq!(env(&ss, "PORT_NOVNC_WEB"), Some("8083"));
    }

    #[test]
    fn serializes_to_kubernetes_json() {
        let profile = tier::lookup("small").unwrap();
        let set = build_object_set(&identity(), &profile, &WorkloadTemplate::default()).unwrap();

        let claim = serde_json::to_value(&set.home_claim).unwrap();
        assert_eq!(claim["apiVersion"], "v1");
        assert_eq!(claim["kind"], "PersistentVolumeClaim");
        assert_eq!(claim["spec"]["storageClassName"], "openebs-hostpath");
        assert_eq!(claim["spec"]["resources"]["requests"]["storage"], "50Gi");

        let ss = serde_json::to_value(&set.workload).unwrap();
        assert_eq!(ss["apiVersion"], "apps/v1");
        assert_eq!(ss["kind"], "StatefulSet");
        assert_eq!(ss["spec"]["serviceName"], "steam-ab12");
        assert_eq!(ss["spec"]["template"]["spec"]["hostNetwork"], true);
        let volumes = &ss["spec"]["template"]["spec"]["volumes"];
        assert_eq!(volumes[0]["persistentVolumeClaim"]["claimName"], "steam-ab12-home");
        assert_eq!(volumes[2]["hostPath"]["path"], "/dev/input/");
        assert_eq!(volumes[3]["emptyDir"]["medium"], "Memory");
    }

    #[test]
    fn building_is_deterministic() {
        let profile = tier::lookup("medium").unwrap();
        let template = WorkloadTemplate::default();
        let a = build_object_set(&identity(), &profile, &template).unwrap();
        let b = build_object_set(&identity(), &profile, &template).unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn rejects_zero_quantities() {
        let profile = ResourceProfile {
            cpu_millis: 1000,
            memory_mib: 1024,
            home_storage_gib: 0,
            games_storage_gib: 10,
        };
        let err = home_claim(&identity(), &profile, &WorkloadTemplate::default()).unwrap_err();
        assert_eq!(
            err,
            ManifestError::ZeroQuantity {
                field: "home_storage_gib"
            }
        );

        let profile = ResourceProfile {
            cpu_millis: 0,
            ..tier::lookup("small").unwrap()
        };
        let err = workload(&identity(), &profile, &WorkloadTemplate::default()).unwrap_err();
        assert_eq!(err, ManifestError::ZeroQuantity { field: "cpu_millis" });
    }

    #[test]
    fn rejects_invalid_session_names() {
        let profile = tier::lookup("small").unwrap();
        let too_long = "a".repeat(64);
        for bad in ["", "Steam-AB12", "steam_ab12", "-steam", too_long.as_str()] {
            let mut id = identity();
            id.session_id = bad.to_string();
            let err = workload(&id, &profile, &WorkloadTemplate::default()).unwrap_err();
            assert!(matches!(err, ManifestError::InvalidName { .. }), "{bad}");
        }
    }

    #[test]
    fn rejects_broken_template() {
        let profile = tier::lookup("small").unwrap();
        let template = WorkloadTemplate {
            port: 0,
            ..WorkloadTemplate::default()
        };
        let err = workload(&identity(), &profile, &template).unwrap_err();
        assert_eq!(err, ManifestError::ZeroQuantity { field: "port" });

        let template = WorkloadTemplate {
            storage_class: " ".to_string(),
            ..WorkloadTemplate::default()
        };
        let err = games_claim(&identity(), &profile, &template).unwrap_err();
        assert_eq!(err, ManifestError::Empty { field: "storage_class" });
    }
}
