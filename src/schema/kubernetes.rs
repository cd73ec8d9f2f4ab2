//! Built-in merge strategies for the common Kubernetes resource kinds.

/// KUBERNETES_SCHEMA_YAML declares the merge keys Kubernetes uses for its
/// strategic merge patches, and the group/version/kind of every resource the
/// built-in registry knows. Fields that are not declared are deduced: maps
/// merge per field, lists are replaced wholesale.
pub const KUBERNETES_SCHEMA_YAML: &str = r#"types:
- name: __untyped_atomic_
  scalar: untyped
  list:
    elementType:
      namedType: __untyped_atomic_
    elementRelationship: atomic
  map:
    elementType:
      namedType: __untyped_atomic_
    elementRelationship: atomic
- name: __untyped_deduced_
  scalar: untyped
  list:
    elementType:
      namedType: __untyped_atomic_
    elementRelationship: atomic
  map:
    elementType:
      namedType: __untyped_deduced_
    elementRelationship: separable
- name: objectMeta
  map:
    fields:
    - name: finalizers
      type:
        list:
          elementType:
            scalar: string
          elementRelationship: associative
    - name: ownerReferences
      type:
        list:
          elementType:
            namedType: __untyped_deduced_
          elementRelationship: associative
          keys:
          - uid
    elementType:
      namedType: __untyped_deduced_
- name: object
  map:
    fields:
    - name: metadata
      type:
        namedType: objectMeta
    elementType:
      namedType: __untyped_deduced_
- name: workload
  map:
    fields:
    - name: metadata
      type:
        namedType: objectMeta
    - name: spec
      type:
        namedType: workloadSpec
    elementType:
      namedType: __untyped_deduced_
- name: workloadSpec
  map:
    fields:
    - name: template
      type:
        namedType: podTemplateSpec
    elementType:
      namedType: __untyped_deduced_
- name: cronJob
  map:
    fields:
    - name: metadata
      type:
        namedType: objectMeta
    - name: spec
      type:
        map:
          fields:
          - name: jobTemplate
            type:
              namedType: workload
          elementType:
            namedType: __untyped_deduced_
    elementType:
      namedType: __untyped_deduced_
- name: podTemplateSpec
  map:
    fields:
    - name: metadata
      type:
        namedType: objectMeta
    - name: spec
      type:
        namedType: podSpec
    elementType:
      namedType: __untyped_deduced_
- name: podSpec
  map:
    fields:
    - name: containers
      type:
        namedType: containerList
    - name: initContainers
      type:
        namedType: containerList
    - name: ephemeralContainers
      type:
        namedType: containerList
    - name: volumes
      type:
        namedType: namedList
    - name: imagePullSecrets
      type:
        namedType: namedList
    - name: hostAliases
      type:
        list:
          elementType:
            namedType: __untyped_deduced_
          elementRelationship: associative
          keys:
          - ip
    elementType:
      namedType: __untyped_deduced_
- name: containerList
  list:
    elementType:
      namedType: container
    elementRelationship: associative
    keys:
    - name
- name: namedList
  list:
    elementType:
      namedType: __untyped_deduced_
    elementRelationship: associative
    keys:
    - name
- name: container
  map:
    fields:
    - name: ports
      type:
        list:
          elementType:
            namedType: __untyped_deduced_
          elementRelationship: associative
          keys:
          - containerPort
    - name: env
      type:
        namedType: namedList
    - name: volumeMounts
      type:
        list:
          elementType:
            namedType: __untyped_deduced_
          elementRelationship: associative
          keys:
          - mountPath
    - name: volumeDevices
      type:
        list:
          elementType:
            namedType: __untyped_deduced_
          elementRelationship: associative
          keys:
          - devicePath
    elementType:
      namedType: __untyped_deduced_
- name: pod
  map:
    fields:
    - name: metadata
      type:
        namedType: objectMeta
    - name: spec
      type:
        namedType: podSpec
    elementType:
      namedType: __untyped_deduced_
- name: service
  map:
    fields:
    - name: metadata
      type:
        namedType: objectMeta
    - name: spec
      type:
        map:
          fields:
          - name: ports
            type:
              list:
                elementType:
                  namedType: __untyped_deduced_
                elementRelationship: associative
                keys:
                - port
          elementType:
            namedType: __untyped_deduced_
    elementType:
      namedType: __untyped_deduced_
resources:
- {group: "", version: v1, kind: Pod, type: pod}
- {group: "", version: v1, kind: Service, type: service}
- {group: "", version: v1, kind: ConfigMap, type: object}
- {group: "", version: v1, kind: Secret, type: object}
- {group: "", version: v1, kind: ServiceAccount, type: object}
- {group: "", version: v1, kind: Namespace, type: object}
- {group: "", version: v1, kind: PersistentVolume, type: object}
- {group: "", version: v1, kind: PersistentVolumeClaim, type: object}
- {group: "", version: v1, kind: ReplicationController, type: workload}
- {group: "", version: v1, kind: Endpoints, type: object}
- {group: "", version: v1, kind: LimitRange, type: object}
- {group: "", version: v1, kind: ResourceQuota, type: object}
- {group: apps, version: v1, kind: Deployment, type: workload}
- {group: apps, version: v1, kind: StatefulSet, type: workload}
- {group: apps, version: v1, kind: DaemonSet, type: workload}
- {group: apps, version: v1, kind: ReplicaSet, type: workload}
- {group: apps, version: v1beta1, kind: Deployment, type: workload}
- {group: apps, version: v1beta1, kind: StatefulSet, type: workload}
- {group: apps, version: v1beta2, kind: Deployment, type: workload}
- {group: apps, version: v1beta2, kind: StatefulSet, type: workload}
- {group: apps, version: v1beta2, kind: DaemonSet, type: workload}
- {group: extensions, version: v1beta1, kind: Deployment, type: workload}
- {group: extensions, version: v1beta1, kind: DaemonSet, type: workload}
- {group: extensions, version: v1beta1, kind: Ingress, type: object}
- {group: batch, version: v1, kind: Job, type: workload}
- {group: batch, version: v1, kind: CronJob, type: cronJob}
- {group: batch, version: v1beta1, kind: CronJob, type: cronJob}
- {group: networking.k8s.io, version: v1, kind: Ingress, type: object}
- {group: networking.k8s.io, version: v1, kind: NetworkPolicy, type: object}
- {group: networking.k8s.io, version: v1beta1, kind: Ingress, type: object}
- {group: policy, version: v1, kind: PodDisruptionBudget, type: object}
- {group: policy, version: v1beta1, kind: PodDisruptionBudget, type: object}
- {group: autoscaling, version: v1, kind: HorizontalPodAutoscaler, type: object}
- {group: autoscaling, version: v2, kind: HorizontalPodAutoscaler, type: object}
- {group: rbac.authorization.k8s.io, version: v1, kind: Role, type: object}
- {group: rbac.authorization.k8s.io, version: v1, kind: ClusterRole, type: object}
- {group: rbac.authorization.k8s.io, version: v1, kind: RoleBinding, type: object}
- {group: rbac.authorization.k8s.io, version: v1, kind: ClusterRoleBinding, type: object}
- {group: storage.k8s.io, version: v1, kind: StorageClass, type: object}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ElementRelationship, Schema, TypeRef};

    #[test]
    fn test_kubernetes_schema_parses() {
        let schema: Result<Schema, _> = serde_yaml::from_str(KUBERNETES_SCHEMA_YAML);
        assert!(schema.is_ok(), "Failed to parse kubernetes schema: {:?}", schema.err());

        let schema = schema.unwrap();
        for name in ["object", "workload", "podSpec", "container", "service"] {
            assert!(schema.find_named_type(name).is_some(), "missing type {}", name);
        }
    }

    #[test]
    fn test_containers_are_keyed_by_name() {
        let schema: Schema = serde_yaml::from_str(KUBERNETES_SCHEMA_YAML).unwrap();
        let pod_spec = schema.resolve(&TypeRef::named("podSpec")).unwrap().map.unwrap();
        let containers = schema.resolve(&pod_spec.field_type("containers")).unwrap();
        let list = containers.list.unwrap();
        assert_eq!(list.element_relationship, ElementRelationship::Associative);
        assert_eq!(list.keys, vec!["name".to_string()]);
    }
}
