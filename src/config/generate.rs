pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# BUCKETLOG CONFIGURATION
# =============================================================================
# Each flush from the log pipeline is written as one JSON Lines object:
#
#   <prefix>/<tag>/<YYYYMMDD>/<HH>/<uuid>.log
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/bucketlog/config.yml
#   3. /etc/bucketlog/config.yml
#
# Any value may reference an environment variable with $env{NAME}.

# =============================================================================
# OUTPUT
# =============================================================================

output:
  # Bucket every flush is written to
  bucket: my-log-bucket

  # Key prefix; leave empty to start keys at the tag
  prefix: logs

  # Field the resolved event time is written under
  time_key: ts

  # What to do with a record field whose key is not a string:
  # 'fail' rejects the whole batch, 'skip' drops just that field
  on_invalid_key: fail

# =============================================================================
# STORAGE
# =============================================================================

storage:
  # One of: gcs, s3, local, memory
  provider: gcs

  # gcs: service-account key file. Omit to use ambient credentials.
  credential: ~/.config/gcloud/bucketlog-sa.json

  # Location hint passed to providers that take one (s3)
  region: us-east1

  # local: directory holding one subdirectory per bucket
  # root: /var/lib/bucketlog

  # s3: custom endpoint for S3-compatible services
  # endpoint: http://localhost:9000
  # allow_http: true
"#
    .to_string()
}
